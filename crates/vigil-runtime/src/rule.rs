//! Rule Adapter
//!
//! A [`Rule`] describes a rule in any supported form: a predicate over the
//! facts, a textual expression, a [`Check`] object, or a [`CheckGroup`] of
//! named checks sharing setup and teardown hooks. Adapting it (when it is
//! added to a monitor) resolves the form once into [`RuleUnit`]s; nothing
//! is evaluated at that point. Expressions are parsed here so syntax
//! errors surface before any run starts.

use crate::error::AdaptError;
use crate::outcome::{CheckError, CheckResult, IntoCheckResult};
use std::fmt;
use std::sync::Arc;
use vigil_core::ast::Expression;
use vigil_core::{FactContext, Severity};
use vigil_parser::ExpressionParser;

pub(crate) type CheckFn = Arc<dyn Fn(&FactContext) -> CheckResult + Send + Sync>;

/// Setup/teardown hook of a monitor or check group
pub type Hook = Arc<dyn Fn(&FactContext) -> Result<(), CheckError> + Send + Sync>;

/// Object exposing a single check operation
pub trait Check: Send + Sync {
    fn check(&self, facts: &FactContext) -> CheckResult;

    /// Rule name; defaults to the implementing type's name
    fn name(&self) -> Option<String> {
        None
    }
}

impl<C: Check + ?Sized> Check for Arc<C> {
    fn check(&self, facts: &FactContext) -> CheckResult {
        (**self).check(facts)
    }

    fn name(&self) -> Option<String> {
        (**self).name()
    }
}

/// Rule in any supported form, plus optional naming metadata
pub struct Rule {
    form: RuleForm,
    name: Option<String>,
    severity: Option<Severity>,
    failure_message: Option<String>,
}

enum RuleForm {
    Predicate {
        check: CheckFn,
        derived_name: Option<String>,
    },
    Expression(String),
    CheckObject {
        check: Arc<dyn Check>,
        type_name: String,
    },
    Group(CheckGroup),
}

impl Rule {
    /// Predicate over the facts; named after the function item, closures are anonymous
    pub fn predicate<F, R>(f: F) -> Self
    where
        F: Fn(&FactContext) -> R + Send + Sync + 'static,
        R: IntoCheckResult,
    {
        Self::from_form(RuleForm::Predicate {
            check: Arc::new(move |facts: &FactContext| f(facts).into_check_result()),
            derived_name: callable_name::<F>(),
        })
    }

    /// Predicate that does not look at the facts
    pub fn nullary<F, R>(f: F) -> Self
    where
        F: Fn() -> R + Send + Sync + 'static,
        R: IntoCheckResult,
    {
        Self::from_form(RuleForm::Predicate {
            check: Arc::new(move |_: &FactContext| f().into_check_result()),
            derived_name: callable_name::<F>(),
        })
    }

    /// Textual expression such as `stats.finish_reason == 'finished'`
    pub fn expression(source: impl Into<String>) -> Self {
        Self::from_form(RuleForm::Expression(source.into()))
    }

    /// Object implementing [`Check`]
    pub fn object<C: Check + 'static>(check: C) -> Self {
        Self::from_form(RuleForm::CheckObject {
            check: Arc::new(check),
            type_name: short_type_name(std::any::type_name::<C>()),
        })
    }

    /// Group of named checks, each becoming its own rule
    pub fn group(group: CheckGroup) -> Self {
        Self::from_form(RuleForm::Group(group))
    }

    fn from_form(form: RuleForm) -> Self {
        Self {
            form,
            name: None,
            severity: None,
            failure_message: None,
        }
    }

    /// Explicit name; on a group this renames the group
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Severity; on a group it applies to members without their own
    pub fn severity(mut self, severity: Severity) -> Self {
        self.severity = Some(severity);
        self
    }

    /// Message reported when the check returns false
    pub fn failure_message(mut self, message: impl Into<String>) -> Self {
        self.failure_message = Some(message.into());
        self
    }

    /// Resolve into evaluable units; `position` is the 1-based index the
    /// first unit will have in its monitor
    pub(crate) fn adapt(self, position: usize) -> Result<Vec<RuleUnit>, AdaptError> {
        let severity = self.severity.unwrap_or_default();

        let unit = |name: String, body: RuleBody, failure_message: Option<String>| RuleUnit {
            name,
            severity,
            failure_message,
            body,
        };

        match self.form {
            RuleForm::Predicate {
                check,
                derived_name,
            } => {
                let name = self
                    .name
                    .or(derived_name)
                    .unwrap_or_else(|| format!("rule #{}", position));
                Ok(vec![unit(name, RuleBody::Predicate(check), self.failure_message)])
            }
            RuleForm::Expression(source) => {
                let ast = ExpressionParser::parse(&source).map_err(|e| {
                    AdaptError::InvalidExpression {
                        expression: source.clone(),
                        message: e.to_string(),
                    }
                })?;
                let name = self.name.unwrap_or_else(|| source.clone());
                let failure_message = self
                    .failure_message
                    .or_else(|| Some(format!("Expression is false: {}", source)));
                Ok(vec![unit(
                    name,
                    RuleBody::Expression { source, ast },
                    failure_message,
                )])
            }
            RuleForm::CheckObject { check, type_name } => {
                let name = self.name.or_else(|| check.name()).unwrap_or(type_name);
                Ok(vec![unit(name, RuleBody::CheckObject(check), self.failure_message)])
            }
            RuleForm::Group(mut group) => {
                if let Some(name) = self.name {
                    group.name = name;
                }
                if group.checks.is_empty() {
                    return Err(AdaptError::EmptyGroup(group.name));
                }

                let checks = std::mem::take(&mut group.checks);
                let shared = Arc::new(GroupHooks {
                    name: group.name,
                    setup: group.setup,
                    teardown: group.teardown,
                    len: checks.len(),
                });

                Ok(checks
                    .into_iter()
                    .enumerate()
                    .map(|(index, member)| RuleUnit {
                        name: member.name,
                        severity: member.severity.or(self.severity).unwrap_or_default(),
                        failure_message: self.failure_message.clone(),
                        body: RuleBody::GroupMember {
                            group: shared.clone(),
                            index,
                            check: member.check,
                        },
                    })
                    .collect())
            }
        }
    }
}

impl From<&str> for Rule {
    fn from(source: &str) -> Self {
        Rule::expression(source)
    }
}

impl From<String> for Rule {
    fn from(source: String) -> Self {
        Rule::expression(source)
    }
}

/// Descriptor of checks sharing one setup and one teardown
///
/// Setup runs once before the first member and teardown once after the
/// last, regardless of member outcomes.
pub struct CheckGroup {
    name: String,
    setup: Option<Hook>,
    teardown: Option<Hook>,
    checks: Vec<GroupCheck>,
}

struct GroupCheck {
    name: String,
    severity: Option<Severity>,
    check: CheckFn,
}

impl CheckGroup {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            setup: None,
            teardown: None,
            checks: Vec::new(),
        }
    }

    pub fn with_setup<F>(mut self, f: F) -> Self
    where
        F: Fn(&FactContext) -> Result<(), CheckError> + Send + Sync + 'static,
    {
        self.setup = Some(Arc::new(f));
        self
    }

    pub fn with_teardown<F>(mut self, f: F) -> Self
    where
        F: Fn(&FactContext) -> Result<(), CheckError> + Send + Sync + 'static,
    {
        self.teardown = Some(Arc::new(f));
        self
    }

    /// Add a named check
    pub fn check<F, R>(self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&FactContext) -> R + Send + Sync + 'static,
        R: IntoCheckResult,
    {
        self.push(name.into(), None, f)
    }

    /// Add a named check with its own severity
    pub fn check_with_severity<F, R>(self, name: impl Into<String>, severity: Severity, f: F) -> Self
    where
        F: Fn(&FactContext) -> R + Send + Sync + 'static,
        R: IntoCheckResult,
    {
        self.push(name.into(), Some(severity), f)
    }

    fn push<F, R>(mut self, name: String, severity: Option<Severity>, f: F) -> Self
    where
        F: Fn(&FactContext) -> R + Send + Sync + 'static,
        R: IntoCheckResult,
    {
        self.checks.push(GroupCheck {
            name,
            severity,
            check: Arc::new(move |facts: &FactContext| f(facts).into_check_result()),
        });
        self
    }

    pub fn len(&self) -> usize {
        self.checks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }
}

/// Lifecycle shared by the members of one adapted group
pub(crate) struct GroupHooks {
    pub(crate) name: String,
    pub(crate) setup: Option<Hook>,
    pub(crate) teardown: Option<Hook>,
    pub(crate) len: usize,
}

/// Adapted rule: the uniform evaluable unit
#[derive(Clone)]
pub struct RuleUnit {
    pub(crate) name: String,
    pub(crate) severity: Severity,
    pub(crate) failure_message: Option<String>,
    pub(crate) body: RuleBody,
}

#[derive(Clone)]
pub(crate) enum RuleBody {
    Predicate(CheckFn),
    Expression {
        source: String,
        ast: Expression,
    },
    CheckObject(Arc<dyn Check>),
    GroupMember {
        group: Arc<GroupHooks>,
        index: usize,
        check: CheckFn,
    },
}

impl RuleUnit {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    /// Message reported when the check returns false
    pub fn failure_message(&self) -> &str {
        self.failure_message.as_deref().unwrap_or("Check returned false")
    }

    /// Source text, for expression rules
    pub fn expression_source(&self) -> Option<&str> {
        match &self.body {
            RuleBody::Expression { source, .. } => Some(source),
            _ => None,
        }
    }

    /// Short label of the rule form
    pub fn form(&self) -> &'static str {
        match self.body {
            RuleBody::Predicate(_) => "predicate",
            RuleBody::Expression { .. } => "expression",
            RuleBody::CheckObject(_) => "check",
            RuleBody::GroupMember { .. } => "group",
        }
    }
}

impl fmt::Debug for RuleUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleUnit")
            .field("name", &self.name)
            .field("severity", &self.severity)
            .field("form", &self.form())
            .finish()
    }
}

/// Identifier of a callable, `None` for closures
pub(crate) fn callable_name<F>() -> Option<String> {
    let name = short_type_name(std::any::type_name::<F>());
    if name.contains("{{closure}}") || name.contains("{closure") {
        None
    } else {
        Some(name)
    }
}

/// Last path segment of a type name, generics stripped
pub(crate) fn short_type_name(full: &str) -> String {
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use vigil_core::Value;

    fn finished(facts: &FactContext) -> bool {
        facts.get_or("finish_reason", "") == Value::from("finished")
    }

    struct FinishedCheck;

    impl Check for FinishedCheck {
        fn check(&self, facts: &FactContext) -> CheckResult {
            Ok(finished(facts))
        }
    }

    #[test]
    fn test_function_item_is_named_after_itself() {
        let units = Rule::predicate(finished).adapt(1).unwrap();
        assert_eq!(units[0].name(), "finished");
        assert_eq!(units[0].form(), "predicate");
    }

    #[test]
    fn test_closure_gets_positional_name() {
        let units = Rule::predicate(|_: &FactContext| true).adapt(3).unwrap();
        assert_eq!(units[0].name(), "rule #3");
    }

    #[test]
    fn test_expression_named_after_source() {
        let units = Rule::expression("stats.finish_reason == 'finished'")
            .adapt(1)
            .unwrap();
        assert_eq!(units[0].name(), "stats.finish_reason == 'finished'");
        assert_eq!(
            units[0].failure_message(),
            "Expression is false: stats.finish_reason == 'finished'"
        );
    }

    #[test]
    fn test_invalid_expression_fails_adaptation() {
        let err = Rule::expression("stats.finish_reason ==").adapt(1).unwrap_err();
        assert!(matches!(err, AdaptError::InvalidExpression { .. }));
    }

    #[test]
    fn test_check_object_named_after_type() {
        let units = Rule::object(FinishedCheck).adapt(1).unwrap();
        assert_eq!(units[0].name(), "FinishedCheck");

        let units = Rule::object(FinishedCheck).named("custom").adapt(1).unwrap();
        assert_eq!(units[0].name(), "custom");
    }

    #[test]
    fn test_group_expands_into_members() {
        let group = CheckGroup::new("ATestCase")
            .check("test_a", finished)
            .check_with_severity("test_b", Severity::High, finished);
        let units = Rule::group(group).severity(Severity::Low).adapt(1).unwrap();

        assert_eq!(units.len(), 2);
        assert_eq!(units[0].name(), "test_a");
        assert_eq!(units[0].severity(), Severity::Low);
        assert_eq!(units[1].severity(), Severity::High);
    }

    #[test]
    fn test_empty_group_is_rejected() {
        let err = Rule::group(CheckGroup::new("empty")).adapt(1).unwrap_err();
        assert!(matches!(err, AdaptError::EmptyGroup(name) if name == "empty"));
    }

    #[test]
    fn test_short_type_name() {
        assert_eq!(short_type_name("vigil_crawl::monitors::FinishReason"), "FinishReason");
        assert_eq!(short_type_name("a::Wrapper<b::Inner>"), "Wrapper");
    }
}
