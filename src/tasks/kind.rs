use std::borrow::Cow;
use std::fmt;

/// What a task is for. Set once at creation; only used for inspection and events.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TaskKind {
    /// Executes a method call delivered to the actor.
    Call,
    /// Waits for a timer to fire.
    Timer,
    /// Anything else, named by the host runtime.
    Custom(Cow<'static, str>),
}

impl TaskKind {
    /// Returns a short stable label for logs/events.
    pub fn as_label(&self) -> &str {
        match self {
            TaskKind::Call => "call",
            TaskKind::Timer => "timer",
            TaskKind::Custom(name) => name,
        }
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}

impl From<&'static str> for TaskKind {
    fn from(label: &'static str) -> Self {
        match label {
            "call" => TaskKind::Call,
            "timer" => TaskKind::Timer,
            other => TaskKind::Custom(Cow::Borrowed(other)),
        }
    }
}

impl From<String> for TaskKind {
    fn from(label: String) -> Self {
        match label.as_str() {
            "call" => TaskKind::Call,
            "timer" => TaskKind::Timer,
            _ => TaskKind::Custom(Cow::Owned(label)),
        }
    }
}
