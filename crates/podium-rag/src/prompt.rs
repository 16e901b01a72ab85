//! Grounded prompt assembly.

use podium_core::Passage;

/// System instruction for the generative model.
pub const SYSTEM_PROMPT: &str = "You are answering questions about conference presentation \
content. Answer using only the provided passages. If the passages do not contain the answer, \
say so. Cite the page or slide a statement comes from.";

/// Build the user prompt: every passage tagged with its provenance,
/// question last.
pub fn build_prompt(question: &str, passages: &[Passage]) -> String {
    let mut prompt = String::from("Passages:\n\n");
    for passage in passages {
        prompt.push_str(&format!(
            "[Source: document {}, {} {}]\n{}\n\n",
            passage.document_id, passage.unit_kind, passage.unit_number, passage.text
        ));
    }
    prompt.push_str(&format!("Question: {question}"));
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use podium_core::UnitKind;

    #[test]
    fn test_prompt_tags_provenance() {
        let passages = vec![Passage {
            chunk_id: "c1".into(),
            document_id: "talk-42".into(),
            unit_kind: UnitKind::Slide,
            unit_number: 3,
            text: "Throughput doubled after the rewrite.".into(),
            score: 0.9,
        }];
        let prompt = build_prompt("what changed?", &passages);
        assert!(prompt.contains("[Source: document talk-42, slide 3]"));
        assert!(prompt.contains("Throughput doubled"));
        assert!(prompt.ends_with("Question: what changed?"));
    }
}
