// Shared prompt fragments.
// Each module that builds prompts defines its own prompts.rs alongside it;
// this file holds the pieces every template repeats.

/// Opening line of every analysis prompt.
pub const ADVISOR_PERSONA: &str = "You are an expert AI career advisor and resume analyst.";

/// Output is shown and downloaded as Markdown, never parsed.
pub const MARKDOWN_FORMAT_INSTRUCTION: &str = "\
    Format your response clearly in Markdown with ## section headers and bullet points \
    for easy reading. Do NOT wrap the response in code fences. \
    Do NOT add commentary before or after the requested sections.";

/// Keeps tailored documents honest.
pub const NO_FABRICATION_INSTRUCTION: &str = "\
    CRITICAL: Use ONLY facts present in the resume. Do NOT invent employers, titles, \
    dates, degrees, certifications or metrics. Reword and reorder, never fabricate.";
