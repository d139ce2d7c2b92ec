//! Answer and quiz composition over retrieved context.
//!
//! Thin orchestration: retrieve the top chunks for a question, assemble a
//! prompt around them, make a single generation call, and attach source
//! attributions. When retrieval comes back empty the fixed no-context answer
//! is returned and no generation call is made.

use std::collections::BTreeSet;

use crate::error::EngineError;
use crate::generate::Generator;
use crate::index::KnowledgeBase;
use crate::models::{AnswerResponse, QuizResponse, SourceRef};

/// Chunks retrieved into the answer prompt.
const ANSWER_CONTEXT_RESULTS: usize = 3;

/// Chunks retrieved for quiz material.
const QUIZ_CONTEXT_RESULTS: usize = 5;

/// Chunks actually inserted into the quiz prompt.
const QUIZ_MATERIAL_CHUNKS: usize = 3;

/// Matching tokens reported per source.
const SOURCE_TERMS: usize = 5;

/// Broad probe used when no quiz topic is given.
const QUIZ_PROBE: &str = "main concepts key points important";

const NO_CONTEXT_ANSWER: &str = "I couldn't find relevant information in your uploaded \
documents to answer this question. Please make sure you've uploaded materials that cover \
this topic, or try rephrasing your question with different keywords.";

const ADVANCED_STYLE: &str = "Provide a comprehensive, technical explanation that includes:
- Detailed technical terminology and precise definitions
- In-depth analysis of processes and mechanisms
- Mathematical formulations, equations, or formulas when applicable
- Advanced conceptual relationships and theoretical implications
- References to established principles and theories";

const BEGINNER_STYLE: &str = "Provide a clear, beginner-friendly explanation that includes:
- Simple, accessible language with helpful analogies
- Step-by-step breakdown of complex concepts
- Real-world examples and practical applications
- Minimal technical jargon, with explanations when necessary
- Easy-to-understand comparisons and metaphors";

/// Answer `question` from the knowledge base, grounding the generation call
/// in the top retrieved chunks.
///
/// The instruction template is chosen by whether `complexity_level`
/// contains `advanced` (case-insensitive). Generation failures propagate as
/// [`EngineError::Generation`]; an empty retrieval short-circuits with the
/// fixed no-context answer instead.
pub async fn generate_answer(
    kb: &KnowledgeBase,
    generator: &dyn Generator,
    question: &str,
    complexity_level: &str,
) -> Result<AnswerResponse, EngineError> {
    let relevant = kb.search(question, ANSWER_CONTEXT_RESULTS);

    if relevant.is_empty() {
        return Ok(AnswerResponse {
            answer: NO_CONTEXT_ANSWER.to_string(),
            sources: Vec::new(),
            context_used: 0,
        });
    }

    let context = relevant
        .iter()
        .enumerate()
        .map(|(i, chunk)| format!("[Source {} from {}]\n{}", i + 1, chunk.filename, chunk.text))
        .collect::<Vec<_>>()
        .join("\n\n");

    let style_instruction = if complexity_level.to_lowercase().contains("advanced") {
        ADVANCED_STYLE
    } else {
        BEGINNER_STYLE
    };

    let prompt = build_answer_prompt(&context, question, style_instruction);
    let answer = generator
        .generate(&prompt)
        .await
        .map_err(EngineError::Generation)?;

    let sources = relevant
        .iter()
        .map(|chunk| SourceRef {
            filename: chunk.filename.clone(),
            confidence: chunk.score,
            matching_terms: chunk
                .matching_tokens
                .iter()
                .take(SOURCE_TERMS)
                .cloned()
                .collect(),
        })
        .collect();

    Ok(AnswerResponse {
        answer,
        sources,
        context_used: relevant.len(),
    })
}

fn build_answer_prompt(context: &str, question: &str, style_instruction: &str) -> String {
    format!(
        "You are Tutor, an intelligent AI study assistant helping students understand their \
course materials. Your role is to provide clear, accurate explanations based on the uploaded \
study documents.

CONTEXT FROM STUDENT'S UPLOADED MATERIALS:
{context}

STUDENT'S QUESTION: {question}

EXPLANATION APPROACH: {style_instruction}

RESPONSE GUIDELINES:
1. Answer the question directly and comprehensively using the provided context
2. Apply the specified complexity level consistently throughout your response
3. Include specific details, examples, and explanations from the context
4. Structure your response clearly with appropriate headings or organization
5. If the context doesn't fully address the question, mention what additional information would be helpful
6. Always ground your response in the provided materials
7. Be engaging and educational while maintaining accuracy

Please provide your detailed response:"
    )
}

/// Generate a practice quiz from material matching `topic` (or a broad probe
/// of the whole knowledge base when no topic is given).
///
/// Fails with [`EngineError::EmptyContent`] when nothing relevant is indexed.
pub async fn generate_quiz(
    kb: &KnowledgeBase,
    generator: &dyn Generator,
    topic: Option<&str>,
    question_count: usize,
) -> Result<QuizResponse, EngineError> {
    let relevant = kb.search(topic.unwrap_or(QUIZ_PROBE), QUIZ_CONTEXT_RESULTS);
    if relevant.is_empty() {
        return Err(EngineError::EmptyContent);
    }

    let material = relevant
        .iter()
        .take(QUIZ_MATERIAL_CHUNKS)
        .map(|chunk| chunk.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");

    let prompt = build_quiz_prompt(&material, question_count);
    let quiz = generator
        .generate(&prompt)
        .await
        .map_err(EngineError::Generation)?;

    let mut seen = BTreeSet::new();
    let source_documents: Vec<String> = relevant
        .iter()
        .take(QUIZ_MATERIAL_CHUNKS)
        .filter(|chunk| seen.insert(chunk.filename.clone()))
        .map(|chunk| chunk.filename.clone())
        .collect();

    Ok(QuizResponse {
        quiz,
        source_documents,
        questions_generated: question_count,
    })
}

fn build_quiz_prompt(material: &str, question_count: usize) -> String {
    format!(
        "Based on the following study material, create {question_count} educational quiz \
questions to test student understanding:

STUDY MATERIAL:
{material}

Please create a variety of question types:
- Multiple choice questions with 4 options each (label A, B, C, D)
- Short answer questions
- True/false questions

For each question:
1. Clearly state the question
2. Provide all answer options (for multiple choice)
3. Indicate the correct answer
4. Give a brief explanation of why the answer is correct

Format the quiz clearly with numbered questions."
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ChunkingConfig;
    use crate::error::GenerationError;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Records prompts and returns a canned completion, or fails on demand.
    struct StubGenerator {
        prompts: Mutex<Vec<String>>,
        fail: bool,
    }

    impl StubGenerator {
        fn ok() -> Self {
            Self {
                prompts: Mutex::new(Vec::new()),
                fail: false,
            }
        }

        fn failing() -> Self {
            Self {
                prompts: Mutex::new(Vec::new()),
                fail: true,
            }
        }

        fn prompts(&self) -> Vec<String> {
            self.prompts.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Generator for StubGenerator {
        fn model_name(&self) -> &str {
            "stub"
        }

        async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            if self.fail {
                Err(GenerationError::Transport("connection refused".to_string()))
            } else {
                Ok("Stubbed answer.".to_string())
            }
        }
    }

    fn seeded_kb() -> KnowledgeBase {
        let kb = KnowledgeBase::new();
        kb.add_document(
            "Newton first law says an object stays at rest unless acted on by a force. \
             Inertia resists changes in motion.",
            "physics.pdf",
            &ChunkingConfig::default(),
        )
        .unwrap();
        kb
    }

    #[tokio::test]
    async fn test_no_context_answer_makes_no_generation_call() {
        let kb = KnowledgeBase::new();
        let stub = StubGenerator::ok();

        let response = generate_answer(&kb, &stub, "anything at all", "beginner")
            .await
            .unwrap();

        assert!(response.answer.contains("couldn't find relevant information"));
        assert!(response.sources.is_empty());
        assert_eq!(response.context_used, 0);
        assert!(stub.prompts().is_empty(), "no external call expected");
    }

    #[tokio::test]
    async fn test_answer_includes_context_and_sources() {
        let kb = seeded_kb();
        let stub = StubGenerator::ok();

        let response = generate_answer(&kb, &stub, "Newton first law", "beginner")
            .await
            .unwrap();

        assert_eq!(response.answer, "Stubbed answer.");
        assert_eq!(response.context_used, 1);
        assert_eq!(response.sources.len(), 1);

        let source = &response.sources[0];
        assert_eq!(source.filename, "physics.pdf");
        assert!(source.confidence > 0.0 && source.confidence <= 1.0);
        assert!(source.matching_terms.len() <= 5);

        let prompts = stub.prompts();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("[Source 1 from physics.pdf]"));
        assert!(prompts[0].contains("STUDENT'S QUESTION: Newton first law"));
    }

    #[tokio::test]
    async fn test_advanced_level_selects_technical_template() {
        let kb = seeded_kb();
        let stub = StubGenerator::ok();

        generate_answer(&kb, &stub, "Newton first law", "Advanced (detailed)")
            .await
            .unwrap();

        let prompts = stub.prompts();
        assert!(prompts[0].contains("technical terminology"));
        assert!(!prompts[0].contains("helpful analogies"));
    }

    #[tokio::test]
    async fn test_beginner_level_selects_analogy_template() {
        let kb = seeded_kb();
        let stub = StubGenerator::ok();

        generate_answer(&kb, &stub, "Newton first law", "beginner")
            .await
            .unwrap();

        let prompts = stub.prompts();
        assert!(prompts[0].contains("helpful analogies"));
        assert!(!prompts[0].contains("technical terminology"));
    }

    #[tokio::test]
    async fn test_generation_failure_propagates() {
        let kb = seeded_kb();
        let stub = StubGenerator::failing();

        let err = generate_answer(&kb, &stub, "Newton first law", "beginner")
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            EngineError::Generation(GenerationError::Transport(_))
        ));
    }

    #[tokio::test]
    async fn test_quiz_uses_topic_material() {
        let kb = seeded_kb();
        let stub = StubGenerator::ok();

        let quiz = generate_quiz(&kb, &stub, Some("inertia"), 4).await.unwrap();

        assert_eq!(quiz.quiz, "Stubbed answer.");
        assert_eq!(quiz.questions_generated, 4);
        assert_eq!(quiz.source_documents, vec!["physics.pdf".to_string()]);

        let prompts = stub.prompts();
        assert!(prompts[0].contains("create 4 educational quiz questions"));
        assert!(prompts[0].contains("Inertia resists changes in motion."));
    }

    #[tokio::test]
    async fn test_quiz_without_material_is_empty_content() {
        let kb = KnowledgeBase::new();
        let stub = StubGenerator::ok();

        let err = generate_quiz(&kb, &stub, None, 5).await.unwrap_err();
        assert!(matches!(err, EngineError::EmptyContent));
        assert!(stub.prompts().is_empty());
    }
}
