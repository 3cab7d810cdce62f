//! Built-in prompt definitions.

use crate::types::PromptDefinition;

/// Prompt used when the configuration names none.
pub const DEFAULT_PROMPT_ID: &str = "legal.answer.ar";

const ARABIC_NOT_AVAILABLE: &str = "المعلومات المطلوبة غير متوفرة في النص المقدم";

const ARABIC_TEMPLATE: &str = "أنت مساعد قانوني متخصص في الإجابة على الأسئلة المتعلقة بقانون الأحوال الشخصية المصري بناءً على النص المقدم.
استخدم الأجزاء التالية من السياق المسترجع للإجابة على السؤال بدقة.
أجب باللغة العربية فقط.
اجعل إجابتك فيها كل التفاصيل المتاحة في النص المقدم.
احرص على الاستشهاد بالمواد القانونية ذات الصلة إن وجدت.
إذا كانت الإجابة غير موجودة في النص المقدم، فقل بوضوح \"{{notAvailable}}\".

السياق:
{{context}}";

const ENGLISH_NOT_AVAILABLE: &str = "The requested information is not available in the provided text.";

const ENGLISH_TEMPLATE: &str = "You are a legal assistant answering questions about the statute supplied below.
Use only the retrieved context passages to answer the question precisely.
Answer in {{language}} only.
Include every relevant detail the text provides.
Cite the relevant articles where they exist.
If the answer is not contained in the provided text, say exactly \"{{notAvailable}}\".

Context:
{{context}}";

/// All built-in definitions.
pub fn builtin_prompts() -> Vec<PromptDefinition> {
    vec![
        PromptDefinition {
            id: "legal.answer.ar".to_string(),
            title: "المستشار القانوني للأحوال الشخصية".to_string(),
            api_version: "1.0".to_string(),
            language: "Arabic".to_string(),
            not_available: ARABIC_NOT_AVAILABLE.to_string(),
            template: ARABIC_TEMPLATE.to_string(),
            context_separator: "\n\n".to_string(),
        },
        PromptDefinition {
            id: "legal.answer.en".to_string(),
            title: "Statutory legal assistant".to_string(),
            api_version: "1.0".to_string(),
            language: "English".to_string(),
            not_available: ENGLISH_NOT_AVAILABLE.to_string(),
            template: ENGLISH_TEMPLATE.to_string(),
            context_separator: "\n\n".to_string(),
        },
    ]
}

/// Look up a built-in definition by id.
pub fn builtin_prompt(id: &str) -> Option<PromptDefinition> {
    builtin_prompts().into_iter().find(|p| p.id == id)
}
