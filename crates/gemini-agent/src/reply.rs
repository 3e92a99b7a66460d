use serde::Deserialize;

/// What the model answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AiReply {
    /// Anything that is not the structured object, shown as-is.
    Text(String),
    Structured {
        message: String,
        run_command: String,
    },
}

#[derive(Deserialize)]
struct RawReply {
    message: Option<String>,
    #[serde(rename = "runCommand")]
    run_command: Option<String>,
}

impl AiReply {
    /// Parse reply text as `{"message": …, "runCommand": …}`, tolerating a
    /// surrounding Markdown code fence. Falls back to [`AiReply::Text`].
    pub fn parse(text: &str) -> AiReply {
        let candidate = strip_code_fence(text);
        match serde_json::from_str::<RawReply>(candidate) {
            Ok(RawReply {
                message: None,
                run_command: None,
            })
            | Err(_) => AiReply::Text(text.trim().to_owned()),
            Ok(raw) => AiReply::Structured {
                message: raw.message.unwrap_or_default().trim().to_owned(),
                run_command: raw.run_command.unwrap_or_default().trim().to_owned(),
            },
        }
    }
}

fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string (`json`) on the opening line.
    let body = rest.split_once('\n').map_or("", |(_, body)| body);
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}
