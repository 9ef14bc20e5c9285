//! Timeouts - Scoped deadlines for SDK calls
//!
//! Every SDK call runs under a deadline. When it expires the in-flight call
//! is dropped, which cancels it, and the operation fails.

use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

use gspaas_core::resource::Value;

use crate::client::{ApiError, ApiResult};

const MINUTE: u64 = 60;

/// Per-operation time budgets of a resource kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub create: Duration,
    pub read: Duration,
    pub update: Duration,
    pub delete: Duration,
}

impl Timeouts {
    /// Default for PaaS services
    pub const PAAS: Timeouts = Timeouts::uniform(Duration::from_secs(15 * MINUTE));
    /// Kubernetes clusters take considerably longer to provision
    pub const KUBERNETES: Timeouts = Timeouts::uniform(Duration::from_secs(45 * MINUTE));
    /// SSL certificates and locations
    pub const SHORT: Timeouts = Timeouts::uniform(Duration::from_secs(5 * MINUTE));

    pub const fn uniform(duration: Duration) -> Self {
        Self {
            create: duration,
            read: duration,
            update: duration,
            delete: duration,
        }
    }

    /// Apply a `timeouts` block (`create`/`read`/`update`/`delete`)
    ///
    /// Values are minutes as integers, or strings with an `s`, `m` or `h` suffix.
    pub fn with_overrides(mut self, block: Option<&Value>) -> Result<Self, String> {
        let Some(block) = block else {
            return Ok(self);
        };
        let map = match block {
            Value::Map(map) => map,
            Value::List(items) => match items.first().and_then(Value::as_map) {
                Some(map) => map,
                None => return Ok(self),
            },
            _ => return Err("timeouts must be a block".to_string()),
        };
        for (key, slot) in [
            ("create", &mut self.create),
            ("read", &mut self.read),
            ("update", &mut self.update),
            ("delete", &mut self.delete),
        ] {
            if let Some(value) = map.get(key) {
                *slot = parse_timeout(value).map_err(|e| format!("timeouts.{}: {}", key, e))?;
            }
        }
        Ok(self)
    }

    /// Apply provider-wide overrides where they are set
    pub fn merged(self, overrides: &TimeoutOverrides) -> Self {
        Self {
            create: overrides.create.unwrap_or(self.create),
            read: overrides.read.unwrap_or(self.read),
            update: overrides.update.unwrap_or(self.update),
            delete: overrides.delete.unwrap_or(self.delete),
        }
    }
}

/// Provider-wide timeout settings; unset entries keep the kind's default
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimeoutOverrides {
    pub create: Option<Duration>,
    pub read: Option<Duration>,
    pub update: Option<Duration>,
    pub delete: Option<Duration>,
}

impl TimeoutOverrides {
    pub fn from_map(map: &HashMap<String, Value>) -> Result<Self, String> {
        let get = |key: &str| -> Result<Option<Duration>, String> {
            map.get(key)
                .map(parse_timeout)
                .transpose()
                .map_err(|e| format!("timeouts.{}: {}", key, e))
        };
        Ok(Self {
            create: get("create")?,
            read: get("read")?,
            update: get("update")?,
            delete: get("delete")?,
        })
    }
}

fn parse_timeout(value: &Value) -> Result<Duration, String> {
    match value {
        Value::Int(n) if *n > 0 => (*n as u64)
            .checked_mul(MINUTE)
            .map(Duration::from_secs)
            .ok_or_else(|| format!("{} minutes is too large", n)),
        Value::String(s) => parse_duration(s),
        _ => Err("expected a positive number of minutes or a duration string".to_string()),
    }
}

/// Parse "90s", "20m", "1h" or a bare number of minutes
pub fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    let (digits, unit) = match s.find(|c: char| !c.is_ascii_digit()) {
        Some(pos) => s.split_at(pos),
        None => (s, "m"),
    };
    let amount: u64 = digits
        .parse()
        .map_err(|_| format!("invalid duration '{}'", s))?;
    let scale = match unit {
        "s" => 1,
        "m" => MINUTE,
        "h" => 60 * MINUTE,
        _ => return Err(format!("invalid duration unit in '{}'", s)),
    };
    let seconds = amount
        .checked_mul(scale)
        .ok_or_else(|| format!("duration '{}' is too large", s))?;
    if seconds == 0 {
        return Err(format!("duration '{}' must be positive", s));
    }
    Ok(Duration::from_secs(seconds))
}

/// Run an SDK call under a deadline
pub async fn with_deadline<T, Fut>(deadline: Duration, call: Fut) -> ApiResult<T>
where
    Fut: Future<Output = ApiResult<T>>,
{
    match tokio::time::timeout(deadline, call).await {
        Ok(result) => result,
        Err(_) => Err(ApiError::DeadlineExceeded(deadline)),
    }
}
