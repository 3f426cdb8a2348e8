mod common;

use std::{
	fs,
	sync::{Arc, Mutex},
};

use tome_domain::Note;
use tome_service::{
	ActionError, ActionRegistry, AgentAction, AgentReport, BoxFuture, NewNote, Providers,
	TomeService,
};

use common::{Harness, Reply, StubTranscription, harness, harness_with};

#[derive(Default)]
struct Recorder {
	seen: Mutex<Vec<i64>>,
}
impl AgentAction for Recorder {
	fn apply<'a>(
		&'a self,
		_service: &'a TomeService,
		note: &'a Note,
	) -> BoxFuture<'a, Result<(), ActionError>> {
		self.seen.lock().expect("seen lock").push(note.note_id);

		Box::pin(async { Ok(()) })
	}
}

struct Exploding;
impl AgentAction for Exploding {
	fn apply<'a>(
		&'a self,
		_service: &'a TomeService,
		_note: &'a Note,
	) -> BoxFuture<'a, Result<(), ActionError>> {
		Box::pin(async { Err(ActionError::Failed { message: "Boom.".to_string() }) })
	}
}

fn write_rules(h: &Harness, rules: serde_json::Value) {
	fs::write(&h.service.cfg.agents.rules_path, rules.to_string()).expect("Failed to write rules.");
}

async fn create_and_fetch(h: &Harness, note: NewNote) -> Note {
	let note_id = h.service.create(note).await.expect("Failed to create note.");

	h.service.get_note(note_id).await.expect("Failed to fetch note.").expect("Missing note.")
}

fn with_registry(h: &Harness, registry: ActionRegistry) -> TomeService {
	let providers = Providers::new(
		h.embedding.clone(),
		h.generation.clone(),
		Arc::new(StubTranscription { transcript: None }),
	);

	TomeService::with_store(h.service.cfg.clone(), h.store.clone(), providers)
		.with_actions(registry)
}

#[tokio::test]
async fn reminder_tag_writes_one_calendar_event() {
	let h = harness();

	write_rules(
		&h,
		serde_json::json!({
			"reminder_agent": { "trigger": "tag:reminder", "action": "calendar_event" },
			"share_agent": { "trigger": "tag:share", "action": "share_to_whatsapp" }
		}),
	);

	let note = create_and_fetch(&h, NewNote::text("T", "C").with_tags(["reminder"])).await;
	let report = h.service.run_agents(&note).await;

	assert_eq!(report.fired, vec!["reminder_agent"]);
	assert!(report.failed.is_empty() && report.unknown.is_empty());

	let events_dir = h.service.cfg.agents.output_dir.join("calendar_events");
	let events = fs::read_dir(&events_dir)
		.expect("Missing calendar events directory.")
		.map(|entry| entry.expect("Bad directory entry.").path())
		.collect::<Vec<_>>();

	assert_eq!(events.len(), 1);
	assert!(events[0].ends_with(format!("event_{}.ics", note.note_id)));

	let event = fs::read_to_string(&events[0]).expect("Failed to read event.");

	assert!(event.contains(&format!("UID:{}@tome", note.note_id)));
	assert!(event.contains("SUMMARY:T\r\n"));
	assert!(event.contains("DESCRIPTION:C\r\n"));

	let reminders = fs::read_to_string(h.service.cfg.agents.output_dir.join("reminders.ics"))
		.expect("Missing reminders calendar.");

	assert_eq!(reminders.matches("BEGIN:VEVENT").count(), 1);
	assert!(!h.service.cfg.agents.output_dir.join("whatsapp_shares.log").exists());
}

#[tokio::test]
async fn rules_fire_in_file_order_by_tag_condition() {
	let h = harness();
	let recorder = Arc::new(Recorder::default());
	let registry = ActionRegistry::default().with("record", recorder.clone());
	let service = with_registry(&h, registry);

	write_rules(
		&h,
		serde_json::json!({
			"untagged": { "trigger": "tag:[]", "action": "record" },
			"work": { "trigger": "tag:work", "action": "record" },
			"broken": { "trigger": "work", "action": "record" },
			"incomplete": { "trigger": "tag:work" }
		}),
	);

	let plain = create_and_fetch(&h, NewNote::text("Plain", "apple")).await;
	let work = create_and_fetch(&h, NewNote::text("Job", "engine").with_tags(["work"])).await;
	let other = create_and_fetch(&h, NewNote::text("Misc", "milk").with_tags(["home"])).await;

	assert_eq!(service.run_agents(&plain).await.fired, vec!["untagged"]);
	assert_eq!(service.run_agents(&work).await.fired, vec!["work"]);
	assert!(service.run_agents(&other).await.is_empty());
	assert_eq!(*recorder.seen.lock().expect("seen lock"), vec![plain.note_id, work.note_id]);
}

#[tokio::test]
async fn unknown_and_failing_actions_do_not_stop_later_rules() {
	let h = harness();
	let recorder = Arc::new(Recorder::default());
	let registry = ActionRegistry::default()
		.with("explode", Arc::new(Exploding))
		.with("record", recorder.clone());
	let service = with_registry(&h, registry);

	write_rules(
		&h,
		serde_json::json!({
			"a": { "trigger": "tag:x", "action": "teleport" },
			"b": { "trigger": "tag:x", "action": "explode" },
			"c": { "trigger": "tag:x", "action": "record" }
		}),
	);

	let note = create_and_fetch(&h, NewNote::text("X", "rocket").with_tags(["x"])).await;
	let report = service.run_agents(&note).await;

	assert_eq!(
		report,
		AgentReport {
			fired: vec!["c".to_string()],
			failed: vec!["b".to_string()],
			unknown: vec!["a".to_string()],
		}
	);
	assert_eq!(recorder.seen.lock().expect("seen lock").len(), 1);
}

#[tokio::test]
async fn missing_or_malformed_rules_file_runs_nothing() {
	let h = harness();
	let note = create_and_fetch(&h, NewNote::text("T", "C").with_tags(["reminder"])).await;

	assert!(h.service.run_agents(&note).await.is_empty());

	fs::write(&h.service.cfg.agents.rules_path, "[1, 2, 3]").expect("Failed to write rules.");

	assert!(h.service.run_agents(&note).await.is_empty());
}

#[tokio::test]
async fn suggest_tags_unions_generated_tags() {
	let h = harness_with(|_| {}, Reply::Text("work, Urgent ,  , home".to_string()));

	write_rules(
		&h,
		serde_json::json!({ "tagger": { "trigger": "tag:home", "action": "suggest_tags" } }),
	);

	let note = create_and_fetch(&h, NewNote::text("Chores", "milk").with_tags(["home"])).await;
	let report = h.service.run_agents(&note).await;
	let updated = h.service.get_note(note.note_id).await.expect("get").expect("Missing note.");

	assert_eq!(report.fired, vec!["tagger"]);
	assert_eq!(updated.tags, vec!["home", "work", "Urgent"]);
	assert!(h.generation.prompts()[0].starts_with("Suggest 1 to 3 tags for this note: milk"));
}

#[tokio::test]
async fn rephrase_rewrites_content_and_reindexes() {
	let h = harness_with(|_| {}, Reply::Text("rocket engine".to_string()));

	write_rules(&h, serde_json::json!({ "polish": { "trigger": "tag:[]", "action": "rephrase" } }));

	let fruit = create_and_fetch(&h, NewNote::text("Fruit", "apple")).await;
	let draft = create_and_fetch(&h, NewNote::text("Draft", "banana")).await;
	let report = h.service.run_agents(&draft).await;
	let updated = h.service.get_note(draft.note_id).await.expect("get").expect("Missing note.");

	assert_eq!(report.fired, vec!["polish"]);
	assert_eq!(updated.content, "rocket engine");
	assert_eq!(h.service.similar_notes("rocket", 1).await.expect("search"), vec![draft.note_id]);
	assert_eq!(h.service.similar_notes("apple", 1).await.expect("search"), vec![fruit.note_id]);
}

#[tokio::test]
async fn rephrase_failure_leaves_content_untouched() {
	let h = harness_with(|_| {}, Reply::Fail);

	write_rules(&h, serde_json::json!({ "polish": { "trigger": "tag:[]", "action": "rephrase" } }));

	let note = create_and_fetch(&h, NewNote::text("Draft", "banana")).await;
	let report = h.service.run_agents(&note).await;
	let stored = h.service.get_note(note.note_id).await.expect("get").expect("Missing note.");

	assert_eq!(report.failed, vec!["polish"]);
	assert_eq!(stored.content, "banana");
	assert_eq!(stored.updated_at, note.updated_at);
}

#[tokio::test]
async fn share_writes_log_entry_and_share_file() {
	let h = harness();

	write_rules(
		&h,
		serde_json::json!({ "share": { "trigger": "tag:family", "action": "share_to_whatsapp" } }),
	);

	let note =
		create_and_fetch(&h, NewNote::text("Dinner", "Sunday at 7").with_tags(["family"])).await;

	assert_eq!(h.service.run_agents(&note).await.fired, vec!["share"]);
	assert_eq!(h.service.run_agents(&note).await.fired, vec!["share"]);

	let output_dir = &h.service.cfg.agents.output_dir;
	let message =
		fs::read_to_string(output_dir.join(format!("whatsapp_share_{}.txt", note.note_id)))
			.expect("Missing share file.");
	let log = fs::read_to_string(output_dir.join("whatsapp_shares.log")).expect("Missing log.");

	assert!(message.starts_with("Shared Note: Dinner\n\nSunday at 7"));
	assert_eq!(log.matches("WhatsApp Share: Dinner").count(), 2);
}
