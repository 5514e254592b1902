//! Configuration validation
//!
//! Validation rules:
//! - sink names unique and non-empty
//! - tick timeout and tick frequency positive
//! - topology precision positive, max_walk_steps nonzero
//! - ego role non-empty
//! - dequeue timeout nonzero

use std::collections::HashSet;

use contracts::{ContractError, ScenarioBlueprint};

/// Validate a ScenarioBlueprint
///
/// Returns the first error encountered, or Ok(()).
pub fn validate(blueprint: &ScenarioBlueprint) -> Result<(), ContractError> {
    validate_world(blueprint)?;
    validate_frame(blueprint)?;
    validate_mock(blueprint)?;
    validate_topology(blueprint)?;
    validate_sinks(blueprint)?;
    Ok(())
}

fn validate_world(blueprint: &ScenarioBlueprint) -> Result<(), ContractError> {
    let world = &blueprint.world;

    if world.tick_timeout_s <= 0.0 {
        return Err(ContractError::config_validation(
            "world.tick_timeout_s",
            format!("tick_timeout_s must be > 0, got {}", world.tick_timeout_s),
        ));
    }

    if world.ego_role.is_empty() {
        return Err(ContractError::config_validation(
            "world.ego_role",
            "ego_role cannot be empty",
        ));
    }

    Ok(())
}

fn validate_frame(blueprint: &ScenarioBlueprint) -> Result<(), ContractError> {
    let frame = &blueprint.frame;

    if frame.dequeue_timeout_ms == 0 {
        return Err(ContractError::config_validation(
            "frame.dequeue_timeout_ms",
            "dequeue_timeout_ms must be > 0",
        ));
    }

    // An offset further back than one tick per frame can never be satisfied
    // by a live producer.
    for (field, offset) in [
        ("frame.offsets.inertial", frame.offsets.inertial),
        ("frame.offsets.image", frame.offsets.image),
        ("frame.offsets.kinematic", frame.offsets.kinematic),
    ] {
        if !(-1..=0).contains(&offset) {
            return Err(ContractError::config_validation(
                field,
                format!("frame offset must be -1 or 0, got {offset}"),
            ));
        }
    }

    Ok(())
}

fn validate_mock(blueprint: &ScenarioBlueprint) -> Result<(), ContractError> {
    if blueprint.mock.tick_hz <= 0.0 {
        return Err(ContractError::config_validation(
            "mock.tick_hz",
            format!("tick_hz must be > 0, got {}", blueprint.mock.tick_hz),
        ));
    }
    Ok(())
}

fn validate_topology(blueprint: &ScenarioBlueprint) -> Result<(), ContractError> {
    let topology = &blueprint.topology;

    if topology.precision <= 0.0 {
        return Err(ContractError::config_validation(
            "topology.precision",
            format!("precision must be > 0, got {}", topology.precision),
        ));
    }

    if topology.max_walk_steps == 0 {
        return Err(ContractError::config_validation(
            "topology.max_walk_steps",
            "max_walk_steps must be > 0",
        ));
    }

    Ok(())
}

fn validate_sinks(blueprint: &ScenarioBlueprint) -> Result<(), ContractError> {
    let mut seen = HashSet::new();
    for (idx, sink) in blueprint.sinks.iter().enumerate() {
        if sink.name.is_empty() {
            return Err(ContractError::config_validation(
                format!("sinks[{idx}].name"),
                "sink name cannot be empty",
            ));
        }
        if !seen.insert(&sink.name) {
            return Err(ContractError::config_validation(
                format!("sinks[{idx}].name"),
                format!("duplicate sink name '{}'", sink.name),
            ));
        }
        if sink.queue_capacity == 0 {
            return Err(ContractError::config_validation(
                format!("sinks[{idx}].queue_capacity"),
                "queue_capacity must be > 0",
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{SinkConfig, SinkType};

    fn minimal_blueprint() -> ScenarioBlueprint {
        ScenarioBlueprint {
            sinks: vec![SinkConfig {
                name: "log".into(),
                sink_type: SinkType::Log,
                queue_capacity: 100,
                params: Default::default(),
            }],
            ..Default::default()
        }
    }

    #[test]
    fn test_valid_config() {
        let bp = minimal_blueprint();
        assert!(validate(&bp).is_ok());
    }

    #[test]
    fn test_duplicate_sink_name() {
        let mut bp = minimal_blueprint();
        bp.sinks.push(bp.sinks[0].clone());
        let result = validate(&bp);
        assert!(result.is_err());
        let err = result.unwrap_err().to_string();
        assert!(err.contains("duplicate sink name"), "got: {err}");
    }

    #[test]
    fn test_empty_sink_name() {
        let mut bp = minimal_blueprint();
        bp.sinks[0].name = String::new();
        let err = validate(&bp).unwrap_err().to_string();
        assert!(err.contains("cannot be empty"), "got: {err}");
    }

    #[test]
    fn test_invalid_tick_timeout() {
        let mut bp = minimal_blueprint();
        bp.world.tick_timeout_s = 0.0;
        let err = validate(&bp).unwrap_err().to_string();
        assert!(err.contains("tick_timeout_s"), "got: {err}");
    }

    #[test]
    fn test_invalid_precision() {
        let mut bp = minimal_blueprint();
        bp.topology.precision = -0.5;
        let err = validate(&bp).unwrap_err().to_string();
        assert!(err.contains("precision must be > 0"), "got: {err}");
    }

    #[test]
    fn test_offset_out_of_range() {
        let mut bp = minimal_blueprint();
        bp.frame.offsets.image = -3;
        let err = validate(&bp).unwrap_err().to_string();
        assert!(err.contains("frame offset"), "got: {err}");
    }

    #[test]
    fn test_zero_walk_steps() {
        let mut bp = minimal_blueprint();
        bp.topology.max_walk_steps = 0;
        let err = validate(&bp).unwrap_err().to_string();
        assert!(err.contains("max_walk_steps"), "got: {err}");
    }
}
