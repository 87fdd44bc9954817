use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use folio_domain::stats::GlobalStats;

use crate::{CompletionProvider, FolioService, Result, context};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
	User,
	Assistant,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChatTurn {
	pub role: Role,
	pub content: String,
}

const SYSTEM_PREAMBLE: &str = "You are a financial data assistant for portfolio holdings and \
	trades. Answer using only the portfolio context below. If the context does not contain the \
	answer, say the data does not cover it.";

/// Ordered completion payload: one system message carrying the assembled
/// context verbatim, up to the last `history_turns` prior turns, then the
/// current question.
pub fn completion_messages(
	context: &str,
	history: &[ChatTurn],
	question: &str,
	history_turns: usize,
) -> Vec<Value> {
	let mut messages = Vec::with_capacity(history.len().min(history_turns) + 2);

	messages.push(json!({
		"role": "system",
		"content": format!("{SYSTEM_PREAMBLE}\n\n{context}"),
	}));

	let skip = history.len().saturating_sub(history_turns);

	for turn in &history[skip..] {
		messages.push(json!({ "role": turn.role, "content": turn.content }));
	}

	messages.push(json!({ "role": "user", "content": question }));

	messages
}

impl FolioService {
	/// Full query path: retrieve, assemble the hybrid context, and hand the
	/// prompt to the completion collaborator. `NotIndexed` and provider
	/// failures surface so the host can show a blocking message instead of
	/// answering without grounding.
	pub async fn answer(
		&self,
		completion: &dyn CompletionProvider,
		stats: &GlobalStats,
		question: &str,
		history: &[ChatTurn],
	) -> Result<String> {
		let hits = self.search(question, self.cfg.search.top_k).await?;
		let context =
			context::build_context(stats, Some(&hits), self.cfg.chat.max_context_chars);
		let messages =
			completion_messages(&context, history, question, self.cfg.chat.history_turns);
		let answer = completion.complete(&messages).await?;

		Ok(answer)
	}
}
