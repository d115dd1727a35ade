//! Action Adapter and dispatch
//!
//! An [`Action`] wraps a side-effecting operation with a name and a
//! [`Trigger`]. After its owner has finished evaluating, each action fires
//! or not depending on the owner's aggregate status. A failing action is
//! recorded on the result node and never stops the remaining actions.

use crate::check_evaluator::guarded_action;
use crate::outcome::Status;
use crate::result::ResultNode;
use crate::rule::{callable_name, short_type_name};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use vigil_core::Trigger;

type ActionFn = Arc<dyn Fn(&ResultNode) -> anyhow::Result<()> + Send + Sync>;

/// Object exposing a single run operation
pub trait ActionHandler: Send + Sync {
    /// Run with the owner's result for this run
    fn run(&self, result: &ResultNode) -> anyhow::Result<()>;

    /// Action name; defaults to the implementing type's name
    fn name(&self) -> Option<String> {
        None
    }
}

impl<H: ActionHandler + ?Sized> ActionHandler for Arc<H> {
    fn run(&self, result: &ResultNode) -> anyhow::Result<()> {
        (**self).run(result)
    }

    fn name(&self) -> Option<String> {
        (**self).name()
    }
}

/// Action in any supported form, plus optional naming metadata
pub struct Action {
    run: ActionFn,
    derived_name: Option<String>,
    name: Option<String>,
    trigger: Trigger,
}

impl Action {
    /// Operation receiving the owner's result
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(&ResultNode) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        Self::new(Arc::new(f), callable_name::<F>())
    }

    /// Operation ignoring the result
    pub fn nullary<F>(f: F) -> Self
    where
        F: Fn() -> anyhow::Result<()> + Send + Sync + 'static,
    {
        Self::new(
            Arc::new(move |_: &ResultNode| f()),
            callable_name::<F>(),
        )
    }

    /// Object implementing [`ActionHandler`]
    pub fn object<H: ActionHandler + 'static>(handler: H) -> Self {
        let derived_name = handler
            .name()
            .unwrap_or_else(|| short_type_name(std::any::type_name::<H>()));
        let handler = Arc::new(handler);
        Self::new(
            Arc::new(move |result: &ResultNode| handler.run(result)),
            Some(derived_name),
        )
    }

    fn new(run: ActionFn, derived_name: Option<String>) -> Self {
        Self {
            run,
            derived_name,
            name: None,
            trigger: Trigger::default(),
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Fire only under `trigger` (default ALWAYS)
    pub fn on(mut self, trigger: Trigger) -> Self {
        self.trigger = trigger;
        self
    }

    /// Resolve into a unit; `position` is its 1-based index in the owner
    pub(crate) fn adapt(self, position: usize) -> ActionUnit {
        ActionUnit {
            name: self
                .name
                .or(self.derived_name)
                .unwrap_or_else(|| format!("action #{}", position)),
            trigger: self.trigger,
            run: self.run,
        }
    }
}

impl<H: ActionHandler + 'static> From<H> for Action {
    fn from(handler: H) -> Self {
        Action::object(handler)
    }
}

/// Adapted action: the uniform runnable unit
#[derive(Clone)]
pub struct ActionUnit {
    name: String,
    trigger: Trigger,
    run: ActionFn,
}

impl ActionUnit {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn trigger(&self) -> Trigger {
        self.trigger
    }
}

impl fmt::Debug for ActionUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionUnit")
            .field("name", &self.name)
            .field("trigger", &self.trigger)
            .finish()
    }
}

/// What happened to one action during a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionRecord {
    pub name: String,
    pub trigger: Trigger,
    #[serde(flatten)]
    pub state: ActionState,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionState {
    Executed,
    NotTriggered,
    /// The action raised; the message is kept, the run goes on
    Errored { message: String },
}

impl ActionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionState::Executed => "EXECUTED",
            ActionState::NotTriggered => "NOT_TRIGGERED",
            ActionState::Errored { .. } => "ERRORED",
        }
    }
}

/// Whether an action with `trigger` fires
///
/// `errored` is true when the owner saw an errored rule; for a monitor this
/// is its Errored status, for a suite any errored descendant.
pub fn fires(trigger: Trigger, status: Status, errored: bool) -> bool {
    match trigger {
        Trigger::Always => true,
        Trigger::Passed => status == Status::Passed,
        Trigger::Failed => status == Status::Failed,
        Trigger::Error => errored && status != Status::Skipped,
    }
}

/// Run the qualifying actions in order and record every one of them
pub(crate) fn dispatch(actions: &[ActionUnit], result: &ResultNode, errored: bool) -> Vec<ActionRecord> {
    actions
        .iter()
        .map(|action| {
            let state = if fires(action.trigger, result.status, errored) {
                match guarded_action(|| (action.run)(result)) {
                    Ok(()) => {
                        tracing::debug!(action = %action.name, "Action executed");
                        ActionState::Executed
                    }
                    Err(err) => {
                        tracing::warn!(action = %action.name, error = %format!("{:#}", err), "Action failed");
                        ActionState::Errored {
                            message: format!("{:#}", err),
                        }
                    }
                }
            } else {
                ActionState::NotTriggered
            };

            ActionRecord {
                name: action.name.clone(),
                trigger: action.trigger,
                state,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::NodeKind;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Dummy;

    impl ActionHandler for Dummy {
        fn run(&self, _result: &ResultNode) -> anyhow::Result<()> {
            Ok(())
        }
    }

    struct Bomb;

    impl ActionHandler for Bomb {
        fn run(&self, _result: &ResultNode) -> anyhow::Result<()> {
            anyhow::bail!("Boom!")
        }
    }

    fn node(status: Status) -> ResultNode {
        ResultNode::new("m", NodeKind::Monitor, status)
    }

    #[test]
    fn test_trigger_table() {
        for status in [Status::Passed, Status::Failed, Status::Errored, Status::Skipped] {
            let errored = status == Status::Errored;
            assert!(fires(Trigger::Always, status, errored));
            assert_eq!(fires(Trigger::Passed, status, errored), status == Status::Passed);
            assert_eq!(fires(Trigger::Failed, status, errored), status == Status::Failed);
            assert_eq!(fires(Trigger::Error, status, errored), status == Status::Errored);
        }
    }

    #[test]
    fn test_default_names() {
        assert_eq!(Action::object(Dummy).adapt(1).name(), "Dummy");
        assert_eq!(
            Action::nullary(|| Ok(())).adapt(2).name(),
            "action #2"
        );
        let unit = Action::object(Dummy).named("Action 1").on(Trigger::Failed).adapt(1);
        assert_eq!(unit.name(), "Action 1");
        assert_eq!(unit.trigger(), Trigger::Failed);
    }

    #[test]
    fn test_failing_action_does_not_stop_the_rest() {
        let counter = Arc::new(AtomicUsize::new(0));
        let seen = counter.clone();
        let actions = vec![
            Action::object(Bomb).named("bomb").adapt(1),
            Action::nullary(move || {
                seen.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .adapt(2),
        ];

        let records = dispatch(&actions, &node(Status::Passed), false);
        assert_eq!(
            records[0].state,
            ActionState::Errored {
                message: "Boom!".to_string()
            }
        );
        assert_eq!(records[1].state, ActionState::Executed);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_record_serializes_flat() {
        let record = ActionRecord {
            name: "Action on error".to_string(),
            trigger: Trigger::Error,
            state: ActionState::Errored {
                message: "Boom!".to_string(),
            },
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "name": "Action on error",
                "trigger": "ERROR",
                "state": "ERRORED",
                "message": "Boom!"
            })
        );
        let back: ActionRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, record);
    }
}
