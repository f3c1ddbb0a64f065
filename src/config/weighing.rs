use crate::error::{RelcountError, Result};
use crate::graph::Relationship;
use crate::types::NodeId;

/// Decides how much a single relationship contributes to a cached degree.
pub trait WeighingStrategy: Send + Sync {
    /// Weight of `relationship` as seen from `point_of_view`; always positive.
    fn relationship_weight(&self, relationship: &Relationship, point_of_view: NodeId)
        -> Result<u64>;
}

/// Every relationship counts once.
#[derive(Clone, Copy, Debug, Default)]
pub struct OneForEach;

impl WeighingStrategy for OneForEach {
    fn relationship_weight(&self, _relationship: &Relationship, _point_of_view: NodeId) -> Result<u64> {
        Ok(1)
    }
}

/// Weighs relationships by an integer property, defaulting to one when absent.
#[derive(Clone, Debug)]
pub struct WeighByProperty {
    key: String,
}

impl WeighByProperty {
    /// Weighs by the value of `key`.
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }

    /// Name of the weight property.
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl WeighingStrategy for WeighByProperty {
    fn relationship_weight(&self, relationship: &Relationship, _point_of_view: NodeId) -> Result<u64> {
        let Some(value) = relationship.properties.get(&self.key) else {
            return Ok(1);
        };
        value
            .as_int()
            .and_then(|weight| u64::try_from(weight).ok())
            .filter(|weight| *weight > 0)
            .ok_or_else(|| {
                RelcountError::invalid(format!(
                    "relationship {} has non-positive or non-integer weight {}={}",
                    relationship.id, self.key, value
                ))
            })
    }
}
