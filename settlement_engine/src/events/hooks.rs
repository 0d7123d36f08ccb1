use std::{future::Future, pin::Pin, sync::Arc};

use crate::events::{
    BidPlacedEvent,
    EventHandler,
    EventProducer,
    Handler,
    ListingSettledEvent,
    OfferPlacedEvent,
};

/// The producer handles the engine APIs hold on to. Cloned into [`crate::OfferFlowApi`] and
/// [`crate::SettlementApi`] at construction.
#[derive(Default, Clone)]
pub struct EventProducers {
    pub offer_placed_producer: Vec<EventProducer<OfferPlacedEvent>>,
    pub bid_placed_producer: Vec<EventProducer<BidPlacedEvent>>,
    pub listing_settled_producer: Vec<EventProducer<ListingSettledEvent>>,
}

pub struct EventHandlers {
    pub on_offer_placed: Option<EventHandler<OfferPlacedEvent>>,
    pub on_bid_placed: Option<EventHandler<BidPlacedEvent>>,
    pub on_listing_settled: Option<EventHandler<ListingSettledEvent>>,
}

impl EventHandlers {
    pub fn new(buffer_size: usize, hooks: EventHooks) -> Self {
        let on_offer_placed = hooks.on_offer_placed.map(|f| EventHandler::new(buffer_size, f));
        let on_bid_placed = hooks.on_bid_placed.map(|f| EventHandler::new(buffer_size, f));
        let on_listing_settled = hooks.on_listing_settled.map(|f| EventHandler::new(buffer_size, f));
        Self { on_offer_placed, on_bid_placed, on_listing_settled }
    }

    pub fn producers(&self) -> EventProducers {
        let mut result = EventProducers::default();
        if let Some(handler) = &self.on_offer_placed {
            result.offer_placed_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_bid_placed {
            result.bid_placed_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_listing_settled {
            result.listing_settled_producer.push(handler.subscribe());
        }
        result
    }

    pub async fn start_handlers(self) {
        if let Some(handler) = self.on_offer_placed {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
        if let Some(handler) = self.on_bid_placed {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
        if let Some(handler) = self.on_listing_settled {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
    }
}

#[derive(Default, Clone)]
pub struct EventHooks {
    pub on_offer_placed: Option<Handler<OfferPlacedEvent>>,
    pub on_bid_placed: Option<Handler<BidPlacedEvent>>,
    pub on_listing_settled: Option<Handler<ListingSettledEvent>>,
}

impl EventHooks {
    pub fn on_offer_placed<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(OfferPlacedEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_offer_placed = Some(Arc::new(f));
        self
    }

    pub fn on_bid_placed<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(BidPlacedEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_bid_placed = Some(Arc::new(f));
        self
    }

    pub fn on_listing_settled<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(ListingSettledEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_listing_settled = Some(Arc::new(f));
        self
    }
}
