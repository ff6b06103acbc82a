//! Prompt templates for the council flow
//!
//! Templates only carry the instruction for a stage. Prior outputs travel
//! separately as the ordered context of a backend call, so a template names
//! the authors of that context in the same order.

/// Templates for generating prompts at each stage
pub struct PromptTemplate;

impl PromptTemplate {
    /// Prompt for a member's independent draft
    pub fn draft(question: &str) -> String {
        format!(
            r#"You are a knowledgeable expert sitting on a council of independent advisors.

Please answer the following question:

{}

Provide a clear, well-structured response. Be concise but comprehensive and support your points with reasoning."#,
            question
        )
    }

    /// Prompt for critiquing peer drafts; `peers` lists the draft authors in context order
    pub fn critique(question: &str, peers: &[&str]) -> String {
        let mut prompt = format!(
            r#"You are a critical reviewer on a council of experts.

Original question: {}

The context contains {} draft answer(s) written by other council members, in this order: {}.
"#,
            question,
            peers.len(),
            peers.join(", ")
        );

        if peers.is_empty() {
            prompt.push_str("No peer drafts were available; state that you could not review any.\n");
        }

        prompt.push_str(
            r#"
For each draft, provide:
1. A brief assessment of accuracy and completeness
2. Key strengths
3. Errors or gaps
4. What a final answer should keep or correct

Format your critique with a header per draft."#,
        );
        prompt
    }

    /// Prompt for the chairman; `critics` lists the critique authors in context order
    pub fn synthesis(question: &str, critics: &[&str]) -> String {
        format!(
            r#"You are the chairman of a council of experts.

Original question: {}

The context contains critiques of the council's draft answers, written by: {}.

Based on these critiques, write the final answer to the original question. Keep the points the critiques agree on, resolve disagreements in favor of the better-supported position, and correct any errors they identified.

Answer the question directly; do not describe the review process."#,
            question,
            critics.join(", ")
        )
    }
}
