use crate::core::Tick;

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Key {
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
    Escape,
}

/// User input delivered to the orchestrator's queue. Events are processed in
/// dispatch order at the start of the next tick, so a given input sequence
/// always produces the same frame-by-frame behavior.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InputEvent {
    Wheel { delta: f64 },
    Click { target: String },
    PointerEnter { target: String },
    PointerLeave { target: String },
    Key { key: Key },
    Resize { viewport_height: f64 },
}

/// One step of a simulation script: deliver `event` at tick `at`.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct ScriptStep {
    pub at: Tick,
    #[serde(flatten)]
    pub event: InputEvent,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn script_step_json_shape() {
        let s = r#"{ "at": 12, "kind": "key", "key": "ArrowDown" }"#;
        let step: ScriptStep = serde_json::from_str(s).unwrap();
        assert_eq!(step.at, Tick(12));
        assert_eq!(
            step.event,
            InputEvent::Key {
                key: Key::ArrowDown
            }
        );
    }

    #[test]
    fn click_roundtrip() {
        let ev = InputEvent::Click {
            target: "nextBtn".to_string(),
        };
        let s = serde_json::to_string(&ev).unwrap();
        let de: InputEvent = serde_json::from_str(&s).unwrap();
        assert_eq!(de, ev);
    }
}
