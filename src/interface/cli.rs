// Interactive terminal chat.
//
// You: <question>
// Bot: <answer>            (or a teach prompt when nothing matches)
//
// Reads and writes through generic async streams so the loop can be driven
// by in-memory buffers in tests.

use crate::core::knowledge::{is_quit, Embedder, KnowledgeService, KnowledgeStore};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

const TEACH_PROMPT: &str = "Type the answer or 'Skip' to Skip: ";
const THANKS_REPLY: &str = "Thank you for teaching me the new response.";
const SKIP_WORD: &str = "skip";

/// Run the chat loop until `quit` or end of input.
pub async fn run_chat<E, S, R, W>(
    service: &KnowledgeService<E, S>,
    input: R,
    mut output: W,
) -> anyhow::Result<()>
where
    E: Embedder,
    S: KnowledgeStore,
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = input.lines();

    loop {
        output.write_all(b"You: ").await?;
        output.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let query = line.trim();
        if query.is_empty() {
            continue;
        }

        let reply = match service.ask(query).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::error!(error = %e, "Failed to answer question");
                output
                    .write_all(format!("Bot: Sorry, something went wrong: {e}\n").as_bytes())
                    .await?;
                continue;
            }
        };

        output
            .write_all(format!("Bot: {}\n", reply.response).as_bytes())
            .await?;

        if is_quit(query) {
            break;
        }
        if !reply.needs_teaching {
            continue;
        }

        output.write_all(TEACH_PROMPT.as_bytes()).await?;
        output.flush().await?;
        let Some(answer) = lines.next_line().await? else {
            break;
        };
        let answer = answer.trim();
        if answer.eq_ignore_ascii_case(SKIP_WORD) {
            continue;
        }

        let message = match service.teach(query, answer).await {
            Ok(()) => format!("Bot: {THANKS_REPLY}\n"),
            Err(e) => format!("Bot: Sorry, I couldn't learn that: {e}\n"),
        };
        output.write_all(message.as_bytes()).await?;
    }

    output.flush().await?;
    Ok(())
}
