use std::env;

use chrono::Duration;
use fl_common::{parse_boolean_flag, Money};
use freshlink_engine::{cart::PricingPolicy, OrderPolicy};
use log::*;

const DEFAULT_FL_HOST: &str = "127.0.0.1";
const DEFAULT_FL_PORT: u16 = 8460;
const DEFAULT_FLAT_DELIVERY_FEE_CENTS: i64 = 5_000;
const DEFAULT_FREE_DELIVERY_THRESHOLD_CENTS: i64 = 50_000;
const DEFAULT_ESTIMATED_DELIVERY_HOURS: i64 = 24;
const DEFAULT_EVENT_BUFFER_SIZE: usize = 64;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// The flat surcharge applied to every order group under the free-delivery threshold.
    pub flat_delivery_fee: Money,
    /// Supplier-group subtotals at or above this ship free.
    pub free_delivery_threshold: Money,
    /// The fixed offset added to "now" when a supplier accepts an order.
    pub estimated_delivery_hours: i64,
    /// Depth of each fan-out connection's pending-event queue, and of the notifier hook channels.
    pub event_buffer_size: usize,
    /// When true (the default), stand-in notifier hooks are installed that log outbound order/status messages.
    pub log_notifications: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_FL_HOST.to_string(),
            port: DEFAULT_FL_PORT,
            flat_delivery_fee: Money::from_cents(DEFAULT_FLAT_DELIVERY_FEE_CENTS),
            free_delivery_threshold: Money::from_cents(DEFAULT_FREE_DELIVERY_THRESHOLD_CENTS),
            estimated_delivery_hours: DEFAULT_ESTIMATED_DELIVERY_HOURS,
            event_buffer_size: DEFAULT_EVENT_BUFFER_SIZE,
            log_notifications: true,
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let defaults = ServerConfig::default();
        let host = env::var("FL_HOST").ok().unwrap_or_else(|| DEFAULT_FL_HOST.into());
        let port = env::var("FL_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!("🪛️ {s} is not a valid port for FL_PORT. {e} Using the default, {DEFAULT_FL_PORT}, instead.");
                    DEFAULT_FL_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_FL_PORT);
        let flat_delivery_fee = money_from_env("FL_FLAT_DELIVERY_FEE", defaults.flat_delivery_fee);
        let free_delivery_threshold = money_from_env("FL_FREE_DELIVERY_THRESHOLD", defaults.free_delivery_threshold);
        let estimated_delivery_hours = env::var("FL_ESTIMATED_DELIVERY_HOURS")
            .ok()
            .and_then(|s| {
                s.parse::<i64>()
                    .map_err(|e| {
                        error!("🪛️ {s} is not a valid value for FL_ESTIMATED_DELIVERY_HOURS. {e} Using the default.");
                    })
                    .ok()
            })
            .filter(|h| *h > 0)
            .unwrap_or(DEFAULT_ESTIMATED_DELIVERY_HOURS);
        let event_buffer_size = env::var("FL_EVENT_BUFFER_SIZE")
            .ok()
            .and_then(|s| {
                s.parse::<usize>()
                    .map_err(|e| {
                        error!("🪛️ {s} is not a valid value for FL_EVENT_BUFFER_SIZE. {e} Using the default.");
                    })
                    .ok()
            })
            .filter(|n| *n > 0)
            .unwrap_or(DEFAULT_EVENT_BUFFER_SIZE);
        let log_notifications = parse_boolean_flag(env::var("FL_LOG_NOTIFICATIONS").ok(), true);
        Self {
            host,
            port,
            flat_delivery_fee,
            free_delivery_threshold,
            estimated_delivery_hours,
            event_buffer_size,
            log_notifications,
        }
    }

    /// The engine-side policy derived from this configuration.
    pub fn order_policy(&self) -> OrderPolicy {
        OrderPolicy {
            pricing: PricingPolicy {
                flat_delivery_fee: self.flat_delivery_fee,
                free_delivery_threshold: self.free_delivery_threshold,
            },
            estimated_delivery_offset: Duration::hours(self.estimated_delivery_hours),
        }
    }
}

fn money_from_env(var: &str, default: Money) -> Money {
    match env::var(var) {
        Ok(s) => s.parse::<i64>().map(Money::from_cents).unwrap_or_else(|e| {
            error!("🪛️ {s} is not a valid cent amount for {var}. {e} Using the default, {default}, instead.");
            default
        }),
        Err(_) => default,
    }
}
