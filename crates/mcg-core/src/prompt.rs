//! Model input composition: system prompt, time context, conversation priming,
//! and Morse-aware user message wrapping.

use chrono::{DateTime, TimeDelta, Utc};

use crate::{
    model::types::ChatMessage,
    morse::{decode, is_morse_like},
};

/// Default system prompt: terse, English-only replies using amateur radio shorthand.
pub const SYSTEM_PROMPT: &str = r#"
You are a Morse code communication assistant optimized for vibration-based transmission.
Your responses must be extremely concise using amateur radio abbreviations to minimize transmission time.

CRITICAL REQUIREMENTS:
1. You MUST ALWAYS respond ONLY in English, regardless of input language
2. Use amateur radio Q-codes and abbreviations extensively
3. Maximum 8 words per sentence
4. Omit unnecessary articles (a, an, the)
5. Omit be-verbs when possible
6. Prioritize brevity over politeness

MANDATORY ABBREVIATIONS:
- R = Roger/Understood/Yes
- FB = Fine Business/Good/OK
- TNX = Thanks
- 73 = Best wishes/Goodbye
- OM = Old Man/Friend/You
- UR = Your/You are
- QRT = Stop transmission/End
- QRV = Ready
- QRM = Problem/Interference
- QRN = Static/Don't understand
- QRS = Send slower/Repeat
- QSL = Confirm/Acknowledge
- WX = Weather
- PWR = Power
- SIG = Signal
- NIL = Nothing/None
- BK = Break/Wait
- CL = Clear/Closing
- HR = Hour
- MIN = Minute

RESPONSE STYLE:
- Lead with abbreviation when possible
- Use shortest form of words
- No flowery language or long explanations
- If user uses non-English: "DETECTED NON-ENG MSG. ENG RESPONSE:"

EXAMPLES:
Instead of: "I understand your question about the weather today"
Use: "R WX QSL"

Instead of: "I'm sorry, I don't understand. Could you please repeat that?"
Use: "QRN PLS QRS"

Instead of: "Thank you for your message. How can I help you today?"
Use: "TNX MSG QRV HELP"

ABBREVIATION EXPLANATION RULE:
- ALWAYS add full meanings in parentheses at the end of your response
- Format: (ABBREVIATION=full meaning, ABBREVIATION=full meaning)
- This helps users learn while keeping main response brief

EXAMPLE FORMAT:
User: "How are you today?"
Response: "FB TNX OM QRV HELP (FB=fine business, TNX=thanks, OM=old man/friend, QRV=ready, HELP=help)"

Remember: Every character saved reduces vibration transmission time for accessibility users.
Main response stays brief, explanations help learning.
"#;

const PRIMING_USER: &str =
    "For all future messages, please respond only in English regardless of what language I use.";
const PRIMING_ASSISTANT: &str = "I understand. I will respond only in English for all future messages, regardless of the language you use.";

const KST_OFFSET_HOURS: i64 = 9;

/// How a raw chat message was interpreted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InputKind {
    Text,
    Morse { decoded: String },
    InvalidMorse,
}

impl InputKind {
    pub fn label(&self) -> &'static str {
        match self {
            InputKind::Text => "text",
            InputKind::Morse { .. } => "morse",
            InputKind::InvalidMorse => "invalid_morse",
        }
    }
}

/// Opening exchange for every new conversation.
pub fn priming_messages() -> [ChatMessage; 2] {
    [
        ChatMessage::user(PRIMING_USER),
        ChatMessage::assistant(PRIMING_ASSISTANT),
    ]
}

/// `Current date and time: YYYY-MM-DD HH:MM:SS KST`
pub fn time_context(now: DateTime<Utc>) -> String {
    let kst = now.naive_utc() + TimeDelta::hours(KST_OFFSET_HOURS);
    format!(
        "Current date and time: {}",
        kst.format("%Y-%m-%d %H:%M:%S KST")
    )
}

pub fn system_prompt_at(base: &str, now: DateTime<Utc>) -> String {
    format!("{base}\n\nCURRENT TIME CONTEXT: {}", time_context(now))
}

pub fn classify_input(raw: &str) -> InputKind {
    if !is_morse_like(raw) {
        return InputKind::Text;
    }
    match decode(raw) {
        Ok(decoded) => InputKind::Morse { decoded },
        Err(_) => InputKind::InvalidMorse,
    }
}

/// The user turn actually sent to the model.
pub fn compose_user_message(raw: &str, kind: &InputKind) -> String {
    match kind {
        InputKind::Text => raw.to_string(),
        InputKind::Morse { decoded } => {
            format!("User sent Morse code: {raw}, which means: {decoded}")
        }
        InputKind::InvalidMorse => format!("User sent invalid Morse code: {raw}"),
    }
}
