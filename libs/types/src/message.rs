//! WebSocket wire protocol
//!
//! Frames are JSON objects discriminated by a `type` field. Client frames are
//! parsed in two phases by the gateway so that broken JSON and unknown types
//! produce distinct error kinds.

use crate::ids::{OrderId, Symbol};
use crate::numeric::{Price, Quantity};
use crate::order::{Order, OrderType, Side, TimeInForce};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Subscription channels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChannelKind {
    Trades,
    Ticker,
    Orderbook,
    MarketData,
}

/// A concrete subscription target: channel kind + symbol
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Channel {
    pub kind: ChannelKind,
    pub symbol: Symbol,
}

impl Channel {
    pub fn new(kind: ChannelKind, symbol: Symbol) -> Self {
        Self { kind, symbol }
    }
}

/// Client → server frames
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    #[serde(rename = "PLACE_ORDER")]
    PlaceOrder {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        request_id: Option<String>,
        symbol: Symbol,
        side: Side,
        order_type: OrderType,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        price: Option<Price>,
        quantity: Quantity,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        time_in_force: Option<TimeInForce>,
    },
    #[serde(rename = "CANCEL_ORDER")]
    CancelOrder {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        request_id: Option<String>,
        order_id: OrderId,
    },
    #[serde(rename = "QUERY_ORDER")]
    QueryOrder {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        request_id: Option<String>,
        order_id: OrderId,
    },
    #[serde(rename = "SUBSCRIBE")]
    Subscribe {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        request_id: Option<String>,
        channel: ChannelKind,
        symbol: Symbol,
    },
    #[serde(rename = "UNSUBSCRIBE")]
    Unsubscribe {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        request_id: Option<String>,
        channel: ChannelKind,
        symbol: Symbol,
    },
    #[serde(rename = "PING")]
    Ping {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        request_id: Option<String>,
    },
}

/// One order book price level on the wire
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookLevel {
    pub price: Price,
    pub quantity: Quantity,
}

/// Server → client frames
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerMessage {
    #[serde(rename = "PONG")]
    Pong {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        request_id: Option<String>,
        timestamp: i64,
    },
    #[serde(rename = "ORDER_UPDATE")]
    OrderUpdate { order: Order, timestamp: i64 },
    #[serde(rename = "FILL")]
    Fill {
        order_id: OrderId,
        price: Price,
        quantity: Quantity,
        timestamp: i64,
    },
    #[serde(rename = "MARKET_DATA")]
    MarketData {
        symbol: Symbol,
        sequence_id: u64,
        timestamp: i64,
        price: Price,
        bid: Price,
        ask: Price,
        volume_24h: Decimal,
    },
    #[serde(rename = "TRADE")]
    Trade {
        symbol: Symbol,
        price: Price,
        quantity: Quantity,
        timestamp: i64,
        aggressor_side: Side,
    },
    #[serde(rename = "ORDERBOOK_UPDATE")]
    OrderbookUpdate {
        symbol: Symbol,
        sequence_id: u64,
        bids: Vec<BookLevel>,
        asks: Vec<BookLevel>,
        timestamp: i64,
    },
    #[serde(rename = "ERROR")]
    Error {
        kind: String,
        message: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        request_id: Option<String>,
    },
}

impl ServerMessage {
    /// Short type tag, used for logging and strategy contexts
    pub fn type_name(&self) -> &'static str {
        match self {
            ServerMessage::Pong { .. } => "PONG",
            ServerMessage::OrderUpdate { .. } => "ORDER_UPDATE",
            ServerMessage::Fill { .. } => "FILL",
            ServerMessage::MarketData { .. } => "MARKET_DATA",
            ServerMessage::Trade { .. } => "TRADE",
            ServerMessage::OrderbookUpdate { .. } => "ORDERBOOK_UPDATE",
            ServerMessage::Error { .. } => "ERROR",
        }
    }
}
