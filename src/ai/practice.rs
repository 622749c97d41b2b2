// src/ai/practice.rs
//
// Practice Question Adapter and Answer Evaluator. Question generation shares
// the curriculum adapter's error-object contract; evaluation degrades to a
// deterministic local grader whenever the AI path fails in any way.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use super::{TextGenerator, parse};

/// Per-question outcome in an evaluation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionResult {
    pub question_id: i64,
    pub is_correct: bool,
    pub feedback: String,
}

/// Graded submission, from either the AI path or the fallback grader.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Evaluation {
    pub results: Vec<QuestionResult>,
    pub total_correct: i64,
    pub score: f64,
    pub overall_feedback: String,
}

/// Generates 10 practice questions for a topic.
///
/// Hard failure contract: the returned object has an "error" key and an
/// empty "questions" array.
pub async fn generate_questions(
    generator: &dyn TextGenerator,
    subject: &str,
    topic_title: &str,
    level: &str,
    course_context: &str,
) -> Value {
    let context = if course_context.trim().is_empty() {
        "General"
    } else {
        course_context
    };

    let prompt = format!(
        r#"You are an expert educator. Generate exactly 10 practice questions for the following:

**Subject:** {subject}
**Topic:** {topic_title}
**Level:** {level}
**Course Context:** {context}

Generate a JSON response with this EXACT structure:
{{
    "questions": [
        {{
            "id": 1,
            "question": "The question text",
            "type": "mcq",
            "options": ["A) Option 1", "B) Option 2", "C) Option 3", "D) Option 4"],
            "correct_answer": "A) Option 1",
            "explanation": "Brief explanation of why this is correct"
        }}
    ]
}}

RULES:
- Generate exactly 10 questions
- Mix of MCQ (8 questions) and short answer (2 questions)
- For short answer questions, set type to "short_answer" and options to empty array []
- Questions should test understanding, not just memorization
- Progress from easy to hard
- Return ONLY valid JSON, no markdown code blocks or extra text
"#
    );

    let text = match generator.complete(&prompt, 4096, 0.7).await {
        Ok(text) => text,
        Err(e) => {
            return json!({
                "error": format!("AI service error: {}", e),
                "questions": [],
            });
        }
    };

    match parse::extract_json(&text) {
        Ok(value) => value,
        Err(e) => json!({
            "error": format!("Failed to parse AI response: {}", e),
            "questions": [],
        }),
    }
}

/// Evaluates submitted answers against the stored question list.
///
/// Primary path asks the generator to grade (exact match for mcq, lenient
/// semantic match for short answers). Any failure along that path, from the
/// HTTP call to the final deserialize, drops to `fallback_grade`. This
/// function therefore always produces an `Evaluation`.
pub async fn evaluate_answers(
    generator: &dyn TextGenerator,
    questions: &[Value],
    answers: &[String],
) -> Evaluation {
    let pairs: Vec<Value> = questions
        .iter()
        .enumerate()
        .map(|(i, q)| {
            json!({
                "question": q.get("question").and_then(Value::as_str).unwrap_or(""),
                "correct_answer": q.get("correct_answer").and_then(Value::as_str).unwrap_or(""),
                "student_answer": answers.get(i).map(String::as_str).unwrap_or(""),
                "type": q.get("type").and_then(Value::as_str).unwrap_or("mcq"),
            })
        })
        .collect();

    let prompt = format!(
        r#"You are an expert educator evaluating student answers.

Here are the questions and the student's answers:

{}

Evaluate each answer and return a JSON response:
{{
    "results": [
        {{
            "question_id": 1,
            "is_correct": true,
            "feedback": "Brief feedback"
        }}
    ],
    "total_correct": 7,
    "score": 70.0,
    "overall_feedback": "Overall performance feedback and suggestions"
}}

For MCQ: Compare exact option match
For short answers: Use semantic understanding, be lenient with minor variations
Return ONLY valid JSON, no markdown code blocks
"#,
        serde_json::to_string_pretty(&pairs).unwrap_or_else(|_| "[]".to_string())
    );

    let graded = match generator.complete(&prompt, 4096, 0.3).await {
        Ok(text) => parse::extract_json(&text)
            .ok()
            .and_then(|value| serde_json::from_value::<Evaluation>(value).ok()),
        Err(e) => {
            tracing::warn!("AI evaluation failed, using fallback grader: {}", e);
            None
        }
    };

    graded.unwrap_or_else(|| fallback_grade(questions, answers))
}

/// Deterministic grader: case-insensitive, whitespace-trimmed equality
/// between submitted and correct answer. Missing submissions count as empty
/// strings. Never fails, for any input shape.
pub fn fallback_grade(questions: &[Value], answers: &[String]) -> Evaluation {
    let mut correct = 0i64;
    let mut results = Vec::with_capacity(questions.len());

    for (i, question) in questions.iter().enumerate() {
        let expected = question
            .get("correct_answer")
            .and_then(Value::as_str)
            .unwrap_or("");
        let submitted = answers.get(i).map(String::as_str).unwrap_or("");

        let is_correct = submitted.trim().to_lowercase() == expected.trim().to_lowercase();
        if is_correct {
            correct += 1;
        }

        results.push(QuestionResult {
            question_id: i as i64 + 1,
            is_correct,
            feedback: if is_correct {
                "Correct!".to_string()
            } else {
                format!("Incorrect. The correct answer is: {}", expected)
            },
        });
    }

    let total = questions.len() as i64;
    let score = if total > 0 {
        correct as f64 / total as f64 * 100.0
    } else {
        0.0
    };

    Evaluation {
        results,
        total_correct: correct,
        score,
        overall_feedback: format!("You got {}/{} correct.", correct, total),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::GenerationError;
    use async_trait::async_trait;

    struct FailingGenerator;

    #[async_trait]
    impl TextGenerator for FailingGenerator {
        async fn complete(
            &self,
            _prompt: &str,
            _max_tokens: u32,
            _temperature: f32,
        ) -> Result<String, GenerationError> {
            Err(GenerationError::Request("connection refused".into()))
        }
    }

    struct EchoGenerator(String);

    #[async_trait]
    impl TextGenerator for EchoGenerator {
        async fn complete(
            &self,
            _prompt: &str,
            _max_tokens: u32,
            _temperature: f32,
        ) -> Result<String, GenerationError> {
            Ok(self.0.clone())
        }
    }

    fn question(correct: &str, kind: &str) -> Value {
        json!({
            "question": "q",
            "type": kind,
            "options": [],
            "correct_answer": correct,
            "explanation": ""
        })
    }

    #[test]
    fn fallback_is_case_and_whitespace_insensitive() {
        let questions = vec![question("Paris", "short_answer")];
        let graded = fallback_grade(&questions, &[" paris ".to_string()]);
        assert_eq!(graded.total_correct, 1);
        assert_eq!(graded.score, 100.0);
        assert!(graded.results[0].is_correct);
        assert_eq!(graded.results[0].feedback, "Correct!");
    }

    #[test]
    fn fallback_handles_empty_everything() {
        let graded = fallback_grade(&[], &[]);
        assert_eq!(graded.total_correct, 0);
        assert_eq!(graded.score, 0.0);
        assert!(graded.results.is_empty());
        assert_eq!(graded.overall_feedback, "You got 0/0 correct.");
    }

    #[test]
    fn fallback_treats_missing_answers_as_empty() {
        let questions = vec![question("A) Yes", "mcq"), question("B) No", "mcq")];
        let graded = fallback_grade(&questions, &["A) Yes".to_string()]);
        assert_eq!(graded.total_correct, 1);
        assert_eq!(graded.score, 50.0);
        assert!(!graded.results[1].is_correct);
        assert_eq!(
            graded.results[1].feedback,
            "Incorrect. The correct answer is: B) No"
        );
    }

    #[test]
    fn fallback_scores_eight_of_ten() {
        // 8 mcq answered exactly, 2 short answers left blank.
        let mut questions = Vec::new();
        let mut answers = Vec::new();
        for i in 0..8 {
            questions.push(question(&format!("A) Option {}", i), "mcq"));
            answers.push(format!("A) Option {}", i));
        }
        questions.push(question("ownership", "short_answer"));
        questions.push(question("borrowing", "short_answer"));
        answers.push(String::new());
        answers.push(String::new());

        let graded = fallback_grade(&questions, &answers);
        assert_eq!(graded.total_correct, 8);
        assert_eq!(graded.score, 80.0);
    }

    #[test]
    fn fallback_never_exceeds_bounds() {
        let questions: Vec<Value> = (0..5).map(|_| question("x", "mcq")).collect();
        let answers: Vec<String> = (0..50).map(|_| "x".to_string()).collect();
        let graded = fallback_grade(&questions, &answers);
        assert!(graded.total_correct <= questions.len() as i64);
        assert!((0.0..=100.0).contains(&graded.score));
    }

    #[test]
    fn malformed_questions_do_not_panic_fallback() {
        let questions = vec![json!("just a string"), json!({"no_answer_key": 1}), json!(null)];
        let graded = fallback_grade(&questions, &["anything".to_string()]);
        // Entries without a correct_answer grade as empty strings, so the
        // two unanswered ones match trivially.
        assert_eq!(graded.total_correct, 2);
        assert_eq!(graded.results.len(), 3);
        assert!(!graded.results[0].is_correct);
    }

    #[tokio::test]
    async fn generation_error_yields_empty_questions() {
        let value = generate_questions(&FailingGenerator, "Rust", "Ownership", "beginner", "").await;
        assert!(value.get("error").is_some());
        assert!(value["questions"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn evaluator_falls_back_on_network_failure() {
        let questions = vec![question("Paris", "short_answer")];
        let graded =
            evaluate_answers(&FailingGenerator, &questions, &["PARIS".to_string()]).await;
        assert_eq!(graded.total_correct, 1);
        assert_eq!(graded.score, 100.0);
    }

    #[tokio::test]
    async fn evaluator_falls_back_on_garbage_reply() {
        let questions = vec![question("Paris", "short_answer")];
        let graded = evaluate_answers(
            &EchoGenerator("not json".to_string()),
            &questions,
            &["london".to_string()],
        )
        .await;
        assert_eq!(graded.total_correct, 0);
        assert_eq!(
            graded.results[0].feedback,
            "Incorrect. The correct answer is: Paris"
        );
    }

    #[tokio::test]
    async fn evaluator_uses_ai_grading_when_reply_is_clean() {
        let reply = json!({
            "results": [{"question_id": 1, "is_correct": true, "feedback": "Close enough"}],
            "total_correct": 1,
            "score": 100.0,
            "overall_feedback": "Good work"
        })
        .to_string();
        let questions = vec![question("Paris", "short_answer")];
        let graded = evaluate_answers(
            &EchoGenerator(reply),
            &questions,
            &["the capital of France".to_string()],
        )
        .await;
        assert_eq!(graded.total_correct, 1);
        assert_eq!(graded.results[0].feedback, "Close enough");
    }
}
