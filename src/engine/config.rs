use crate::core::{AcquisitionError, PacketShape};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Acquisition loop settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AcquisitionConfig {
    /// Target sampling frequency in Hz; zero or negative disables pacing
    pub frequency_hz: f64,

    /// Packets batched into each emitted frame (K)
    pub buffer_size: usize,

    /// Poll queue fill level every this many cycles when `buffer_size == 1`
    pub capacity_poll_interval: u32,
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self {
            frequency_hz: 30000.0,
            buffer_size: 1,
            capacity_poll_interval: 50,
        }
    }
}

impl AcquisitionConfig {
    pub fn from_json(config: Value) -> Result<Self, AcquisitionError> {
        let config: Self = serde_json::from_value(config)
            .map_err(|e| AcquisitionError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), AcquisitionError> {
        if self.buffer_size == 0 {
            return Err(AcquisitionError::InvalidConfig(
                "buffer_size must be at least 1".to_string(),
            ));
        }
        if self.capacity_poll_interval == 0 {
            return Err(AcquisitionError::InvalidConfig(
                "capacity_poll_interval must be at least 1".to_string(),
            ));
        }
        if self.frequency_hz.is_nan() {
            return Err(AcquisitionError::InvalidConfig(
                "frequency_hz must be a number".to_string(),
            ));
        }
        Ok(())
    }

    /// Validate against the geometry of the source the loop will read from
    pub fn validate_for(&self, shape: PacketShape) -> Result<(), AcquisitionError> {
        self.validate()?;
        if shape.checked_frame_len(self.buffer_size).is_none() {
            return Err(AcquisitionError::InvalidConfig(format!(
                "buffer_size {} is too large for {} packets",
                self.buffer_size, shape
            )));
        }
        Ok(())
    }

    /// Cycles between fill level polls. Batched reads poll every cycle.
    pub fn effective_poll_interval(&self) -> u64 {
        if self.buffer_size > 1 {
            1
        } else {
            u64::from(self.capacity_poll_interval)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults_match_reference_configuration() {
        let config = AcquisitionConfig::from_json(json!({})).unwrap();

        assert_eq!(config.frequency_hz, 30000.0);
        assert_eq!(config.buffer_size, 1);
        assert_eq!(config.capacity_poll_interval, 50);
        assert_eq!(config.effective_poll_interval(), 50);
    }

    #[test]
    fn test_batched_reads_poll_every_cycle() {
        let config = AcquisitionConfig::from_json(json!({"buffer_size": 4})).unwrap();
        assert_eq!(config.effective_poll_interval(), 1);
    }

    #[test]
    fn test_zero_buffer_size_rejected() {
        let result = AcquisitionConfig::from_json(json!({"buffer_size": 0}));
        assert!(matches!(result, Err(AcquisitionError::InvalidConfig(_))));
    }

    #[test]
    fn test_oversized_batch_rejected_for_shape() {
        let config = AcquisitionConfig {
            buffer_size: usize::MAX / 2,
            ..AcquisitionConfig::default()
        };
        assert!(config.validate().is_ok());
        assert!(matches!(
            config.validate_for(PacketShape::new(2, 2)),
            Err(AcquisitionError::InvalidConfig(_))
        ));

        let config = AcquisitionConfig {
            buffer_size: 64,
            ..AcquisitionConfig::default()
        };
        assert!(config.validate_for(PacketShape::NEUROPIX_3A).is_ok());
    }

    #[test]
    fn test_wrong_type_rejected() {
        let result = AcquisitionConfig::from_json(json!({"frequency_hz": "fast"}));
        assert!(result.is_err());
    }
}
