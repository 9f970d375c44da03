//! Order metadata passed in by the order-management system

use serde::{Deserialize, Serialize};

/// Order priority as tagged by front-of-house
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderPriority {
    #[default]
    Normal,
    High,
    Urgent,
}

/// Order metadata attached to a notification
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OrderData {
    pub id: String,
    pub priority: OrderPriority,
    /// Minutes the order has been waiting
    pub wait_time: f64,
    pub table_number: Option<u32>,
    pub special_instructions: Option<String>,
    pub allergy_alert: bool,
}

impl OrderData {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    pub fn with_priority(mut self, priority: OrderPriority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_wait_time(mut self, minutes: f64) -> Self {
        self.wait_time = minutes;
        self
    }

    pub fn with_table(mut self, table: u32) -> Self {
        self.table_number = Some(table);
        self
    }

    pub fn with_special_instructions(mut self, text: impl Into<String>) -> Self {
        self.special_instructions = Some(text.into());
        self
    }

    pub fn with_allergy_alert(mut self) -> Self {
        self.allergy_alert = true;
        self
    }

    /// True when the order carries non-empty special instructions
    pub fn has_special_instructions(&self) -> bool {
        self.special_instructions
            .as_deref()
            .map(|s| !s.trim().is_empty())
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_host_payload() {
        let json = r#"{"id":"A17","priority":"urgent","waitTime":12.5,"tableNumber":4,"allergyAlert":true}"#;
        let order: OrderData = serde_json::from_str(json).unwrap();
        assert_eq!(order.id, "A17");
        assert_eq!(order.priority, OrderPriority::Urgent);
        assert_eq!(order.table_number, Some(4));
        assert!(order.allergy_alert);
        assert!(!order.has_special_instructions());
    }

    #[test]
    fn test_blank_instructions_do_not_count() {
        let order = OrderData::new("1").with_special_instructions("   ");
        assert!(!order.has_special_instructions());
        let order = OrderData::new("1").with_special_instructions("no onions");
        assert!(order.has_special_instructions());
    }
}
