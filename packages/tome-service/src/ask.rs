use time::format_description::well_known::Rfc3339;

use crate::{Error, Result, TomeService};
use tome_domain::Note;

/// Answer used when no note relates to the question. Cached like a generated answer.
pub const NO_MATCH_ANSWER: &str = "I couldn't find any notes that match your question. Please try adding some notes first or rephrase your question.";
/// Answer used when generation fails. Never cached.
pub const AI_FAILURE_ANSWER: &str = "[AI response failed]";

const NOTE_SEPARATOR_WIDTH: usize = 50;

impl TomeService {
	/// Answers `question` from the most relevant notes. Answers are cached per exact question
	/// string for the lifetime of the service.
	pub async fn ask(&self, question: &str) -> Result<String> {
		if let Some(answer) = self.cached_answer(question)? {
			tracing::debug!("Returning cached answer.");

			return Ok(answer);
		}

		let top_k = self.cfg.search.top_k as usize;
		let notes = self.find_relevant(question, top_k).await?;

		if notes.is_empty() {
			tracing::info!("No relevant notes found.");
			self.cache_answer(question, NO_MATCH_ANSWER)?;

			return Ok(NO_MATCH_ANSWER.to_string());
		}

		let prompt = question_prompt(question, &notes[..notes.len().min(top_k)]);
		let model = self.cfg.providers.generation.model.as_str();
		let Some(answer) = self.generate_answer(model, &prompt).await? else {
			return Ok(AI_FAILURE_ANSWER.to_string());
		};

		self.cache_answer(question, &answer)?;

		Ok(answer)
	}

	/// Answers `question` from the model's general knowledge, with relevant notes as optional
	/// context. Not cached.
	pub async fn ask_web(&self, question: &str) -> Result<String> {
		let top_k = self.cfg.search.top_k as usize;
		let notes = self.find_relevant(question, top_k).await?;
		let prompt = web_prompt(question, &notes[..notes.len().min(top_k)]);
		let model = self.cfg.providers.generation.web_model();
		let answer = self.generate_answer(model, &prompt).await?;

		Ok(answer.unwrap_or_else(|| AI_FAILURE_ANSWER.to_string()))
	}

	/// Runs a generation call. Provider failures degrade to `None`; a missing credential is a
	/// configuration error.
	pub(crate) async fn generate_answer(
		&self,
		model: &str,
		prompt: &str,
	) -> Result<Option<String>> {
		let cfg = &self.cfg.providers.generation;

		match self.providers.generation.generate(cfg, model, prompt).await {
			Ok(answer) => Ok(Some(answer)),
			Err(err @ tome_providers::Error::MissingCredential { .. }) => Err(err.into()),
			Err(err) => {
				tracing::warn!(error = %err, model, "Generation request failed.");

				Ok(None)
			},
		}
	}

	fn cached_answer(&self, question: &str) -> Result<Option<String>> {
		let answers = self.answers.lock().map_err(|_| poisoned_cache())?;

		Ok(answers.get(question).cloned())
	}

	fn cache_answer(&self, question: &str, answer: &str) -> Result<()> {
		let mut answers = self.answers.lock().map_err(|_| poisoned_cache())?;

		answers.insert(question.to_string(), answer.to_string());

		Ok(())
	}
}

fn poisoned_cache() -> Error {
	Error::InvalidRequest { message: "Answer cache lock is poisoned.".to_string() }
}

fn question_prompt(question: &str, notes: &[Note]) -> String {
	format!(
		"Based on the following notes:\n\n{}\n\nQuestion: {question}\n\nPlease answer the question based on the notes provided above. If the notes don't contain enough information to answer the question, please say so.",
		render_notes(notes)
	)
}

fn web_prompt(question: &str, notes: &[Note]) -> String {
	let notes_context = if notes.is_empty() {
		String::new()
	} else {
		format!(
			"\n\nAlso consider these relevant notes from your database:\n\n{}",
			render_notes(notes)
		)
	};

	format!(
		"Please provide a comprehensive and up-to-date answer to this question: {question}{notes_context}\n\nPlease provide current information and insights. If there are relevant notes from the user's database, incorporate that context as well. If the question requires very recent information that might not be in your training data, please note that and provide the best available information."
	)
}

fn render_notes(notes: &[Note]) -> String {
	let separator = "-".repeat(NOTE_SEPARATOR_WIDTH);
	let mut out = String::new();

	for (i, note) in notes.iter().enumerate() {
		let date = note.created_at.format(&Rfc3339).unwrap_or_else(|_| "Unknown".to_string());

		out.push_str(&format!(
			"Note {}:\nTitle: {}\nContent: {}\nTags: {}\nWorkspace: {}\nDate: {date}\n{separator}\n\n",
			i + 1,
			note.title,
			note.content,
			note.tags.join(", "),
			note.workspace,
		));
	}

	out
}
