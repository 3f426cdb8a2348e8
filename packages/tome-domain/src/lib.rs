pub mod agent;
pub mod note;
pub mod time_serde;

pub use agent::{AgentRule, ParsedRules, RejectedRule, Trigger, TriggerParseError};
pub use note::{
	DEFAULT_WORKSPACE, Note, NoteChanges, NoteFilter, has_indexable_content, normalize_tags,
	normalize_workspace, parse_tags,
};
