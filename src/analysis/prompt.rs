use crate::upstream::{ChatMessage, Role};

pub const SYSTEM_PROMPT: &str = r#"You are a job posting legitimacy analyzer. Analyze job descriptions for signs of scams or fake postings.

Score the job posting from 0-100 based on legitimacy:
- 0-30: Very likely a scam
- 31-50: Suspicious, proceed with caution
- 51-70: Possibly legitimate, verify details
- 71-100: Likely legitimate

Consider these red flags:
- Unrealistic salary promises
- Vague job descriptions
- Requests for personal financial information
- Poor grammar and spelling
- Pressure to act quickly
- Requests for upfront payment
- No company details or contact information
- Too good to be true promises
- Pyramid scheme indicators

Consider these legitimacy indicators:
- Detailed job requirements
- Realistic salary ranges
- Professional communication
- Company verification details
- Clear application process
- Specific role responsibilities
- Industry-standard terminology

Return your analysis as JSON with this structure:
{
  "score": number (0-100),
  "explanation": "Brief explanation of the score",
  "factors": ["List of key factors that influenced the score"]
}"#;

pub const USER_PREFIX: &str = "Analyze this job posting:";

/// Instructions go in their own system message; the posting is only ever
/// placed in the user message.
pub fn build_messages(job_description: &str) -> Vec<ChatMessage> {
    vec![
        ChatMessage {
            role: Role::System,
            content: SYSTEM_PROMPT.to_string(),
        },
        ChatMessage {
            role: Role::User,
            content: format!("{USER_PREFIX}\n\n{job_description}"),
        },
    ]
}
