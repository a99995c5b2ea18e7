//! Buffered delivery: drain the producer and assemble one completion document.

use futures_util::{Stream, StreamExt};

use crate::{
    error::ProxyError,
    schemas::{completion_id, BufferedReply, ChoiceView, CompletionDocument, COMPLETION_OBJECT},
};

/// Drain `responses`, keep the last reply, and shape it into a document.
///
/// The first error ends the drain and is returned as-is.
pub async fn collect_document<S>(
    responses: S,
    model: &str,
    prompt_mode: bool,
) -> Result<CompletionDocument, ProxyError>
where
    S: Stream<Item = Result<BufferedReply, ProxyError>>,
{
    futures_util::pin_mut!(responses);

    let mut last = None;
    while let Some(reply) = responses.next().await {
        last = Some(reply?);
    }
    let reply = last.ok_or_else(|| ProxyError::Upstream("reply source produced no response".to_string()))?;

    Ok(build_document(reply, model, prompt_mode))
}

/// Shape one reply into the buffered document.
pub fn build_document(reply: BufferedReply, model: &str, prompt_mode: bool) -> CompletionDocument {
    let choices = reply
        .choices
        .into_iter()
        .enumerate()
        .map(|(index, choice)| ChoiceView::from_reply(index, choice, prompt_mode))
        .collect();

    CompletionDocument {
        id: completion_id(),
        object: COMPLETION_OBJECT.to_string(),
        created: chrono::Utc::now().timestamp(),
        model: model.to_string(),
        choices,
    }
}
