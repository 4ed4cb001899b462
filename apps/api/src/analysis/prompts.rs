// All LLM prompt templates for the analysis pipeline.
// Placeholders: {persona}, {format_instruction}, {no_fabrication},
//               {resume_text}, {job_text}

/// Matching analysis: fit score, strengths, gaps, recommendations, keywords.
pub const MATCHING_ANALYSIS_TEMPLATE: &str = r#"{persona}

RESUME:
{resume_text}

JOB DESCRIPTION:
{job_text}

Please provide a comprehensive analysis with the following sections:

1. **Fit Score** (0-100%): Rate how well this resume matches the job description with a clear percentage, e.g. "Fit Score: 72%".
2. **Key Strengths**: List 3-5 resume areas that align well with the job requirements.
3. **Gaps & Weaknesses**: Identify 2-3 areas where the resume falls short of the job requirements.
4. **Specific Recommendations**: Provide 3-5 actionable recommendations to improve the resume for this specific role.
5. **Keywords to Include**: List the important keywords and phrases from the job description that are missing from the resume.

Use exactly these section names as ## headers.

{format_instruction}"#;

/// Tailored CV: ATS-friendly rewrite of the resume aimed at the job.
pub const TAILORED_CV_TEMPLATE: &str = r#"{persona}
You also write ATS-compatible resumes.

ORIGINAL RESUME:
{resume_text}

TARGET JOB DESCRIPTION:
{job_text}

Rewrite the resume for this specific role:

- Restructure the content so the skills and experience most relevant to the job come first.
- Naturally incorporate keywords from the job description where the resume supports them. Do NOT keyword-stuff.
- Keep an ATS-compatible layout: plain headings, no tables, no columns, no images, standard bullet points.
- Use these standard sections as ## headers, in this order: Summary, Experience, Skills, Education.
- Start the Summary with a 2-3 sentence professional profile aimed at this role.
- Under Experience, keep every role from the original with its dates and rewrite bullets to lead with outcomes.

{no_fabrication}

{format_instruction}"#;

/// Interview guide: likely questions, answers, talking points, STAR examples.
pub const INTERVIEW_GUIDE_TEMPLATE: &str = r#"{persona}
You also coach candidates for interviews.

CANDIDATE RESUME:
{resume_text}

JOB DESCRIPTION:
{job_text}

Prepare a complete interview preparation guide for this candidate and role with these sections:

1. **Likely Interview Questions**: 10 questions the interviewer is likely to ask, each followed by a strategic answer grounded in the resume.
2. **Questions to Ask the Interviewer**: 5-7 thoughtful questions the candidate should ask.
3. **Key Talking Points**: the strongest points of alignment to bring up unprompted.
4. **Addressing Gaps**: talking points that mitigate the gaps between the resume and the job requirements.
5. **Technical Preparation**: technical areas and topics to review before the interview.
6. **Company Research Tips**: what to research about the company and where to look.
7. **STAR Method Examples**: 3-4 examples drawn from the resume, each broken into Situation, Task, Action and Result.

Use exactly these section names as ## headers.

{format_instruction}"#;
