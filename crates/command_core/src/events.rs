/// Notifications published by the command service to subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandEvent {
    DeclarationRegistered {
        name: String,
    },
    RuntimeRegistered {
        name: String,
    },
    RuntimeUnregistered {
        name: String,
    },
    /// Published once per command and condition text.
    ConditionFailed {
        name: String,
        condition: String,
        message: String,
    },
    ScheduledExecutionFailed {
        name: String,
        message: String,
    },
}
