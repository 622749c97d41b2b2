// src/ai/curriculum.rs
//
// Curriculum Generation Adapter: builds the enrollment prompt, parses the
// generated plan, and enforces the resource policy. The adapter never
// returns an Err; failures become an object with an "error" key so the
// caller can distinguish hard failure (no "title") from partial success.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use url::Url;

use super::{LearnerProfile, TextGenerator, parse};

/// Domains resources may point at under `ResourcePolicy::FreeOnly`.
/// A host matches if it equals the domain or is a subdomain of it.
const APPROVED_RESOURCE_DOMAINS: &[&str] = &[
    "youtube.com",
    "freecodecamp.org",
    "w3schools.com",
    "developer.mozilla.org",
    "ocw.mit.edu",
    "geeksforgeeks.org",
    "wikipedia.org",
    "github.com",
    "theodinproject.com",
    "cs50.harvard.edu",
    "khanacademy.org",
];

/// The two deployment modes for generated resources.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourcePolicy {
    /// Free, loginless sites only, using fixed search-URL templates.
    FreeOnly,
    /// No allow-list; paid platforms with price fields are permitted.
    AllowPaid,
}

impl ResourcePolicy {
    pub fn from_flag(free_resources_only: bool) -> Self {
        if free_resources_only {
            ResourcePolicy::FreeOnly
        } else {
            ResourcePolicy::AllowPaid
        }
    }
}

/// Enrollment parameters forwarded into the prompt.
#[derive(Debug, Clone)]
pub struct EnrollmentParams<'a> {
    pub subject: &'a str,
    pub level: &'a str,
    pub reason: &'a str,
    pub duration_weeks: i32,
    pub daily_hours: f64,
}

/// One topic pulled out of a generated plan, with the defaulting rules
/// applied (week 1, day = position, "Topic N", 60 minutes).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedTopic {
    pub week: i32,
    pub day: i32,
    pub title: String,
    pub description: String,
    pub duration_minutes: i32,
    pub resources: Value,
}

/// Generates a personalized curriculum document.
///
/// Hard failure contract: the returned object has an "error" key and no
/// "title" key. An object carrying both is a partial success and is used
/// as-is.
pub async fn generate_curriculum(
    generator: &dyn TextGenerator,
    policy: ResourcePolicy,
    params: &EnrollmentParams<'_>,
    profile: &LearnerProfile,
) -> Value {
    let prompt = build_prompt(params, profile, policy);

    let text = match generator.complete(&prompt, 8192, 0.7).await {
        Ok(text) => text,
        Err(e) => return json!({ "error": format!("AI service error: {}", e) }),
    };

    match parse::extract_json(&text) {
        Ok(mut value) => {
            if policy == ResourcePolicy::FreeOnly {
                scrub_resources(&mut value);
            }
            value
        }
        Err(e) => json!({
            "error": format!("Failed to parse AI response: {}", e),
            "raw_response": e.excerpt,
        }),
    }
}

/// Extracts the topics array from a generated plan, filling gaps.
/// Entries that are not objects are skipped entirely.
pub fn topics_from(plan: &Value) -> Vec<GeneratedTopic> {
    let Some(items) = plan.get("topics").and_then(Value::as_array) else {
        return Vec::new();
    };

    items
        .iter()
        .enumerate()
        .filter(|(_, item)| item.is_object())
        .map(|(i, item)| GeneratedTopic {
            week: item.get("week").and_then(Value::as_i64).unwrap_or(1) as i32,
            day: item
                .get("day")
                .and_then(Value::as_i64)
                .unwrap_or(i as i64 + 1) as i32,
            title: item
                .get("title")
                .and_then(Value::as_str)
                .filter(|t| !t.trim().is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| format!("Topic {}", i + 1)),
            description: item
                .get("description")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            duration_minutes: item
                .get("duration_minutes")
                .and_then(Value::as_i64)
                .unwrap_or(60) as i32,
            resources: item.get("resources").cloned().unwrap_or_else(|| json!([])),
        })
        .collect()
}

fn build_prompt(
    params: &EnrollmentParams<'_>,
    profile: &LearnerProfile,
    policy: ResourcePolicy,
) -> String {
    let reason = if params.reason.trim().is_empty() {
        "General interest"
    } else {
        params.reason
    };
    let min_topics = params.duration_weeks * 5;

    let mut prompt = format!(
        r#"You are an expert curriculum designer. Create a detailed, personalized curriculum for the following:

**Subject:** {subject}
**Level:** {level}
**Duration:** {weeks} weeks, {hours} hours/day
**Reason for learning:** {reason}

**Student Profile:**
- Age: {age}
- Educational Qualification: {qualification}
- Educational Interests: {interests}
- Hobbies: {hobbies}
- Habits: {habits}
- Daily Routine: {routine}
- Ongoing Courses: {ongoing}

Generate a comprehensive JSON response with this EXACT structure:
{{
    "title": "Course Title",
    "description": "Brief course description (2-3 sentences)",
    "curriculum": {{
        "overview": "Course overview paragraph",
        "learning_outcomes": ["outcome1", "outcome2", "outcome3", "outcome4", "outcome5"],
        "prerequisites": ["prereq1", "prereq2"]
    }},
    "topics": [
        {{
            "week": 1,
            "day": 1,
            "title": "Topic Title",
            "description": "What will be covered",
            "duration_minutes": 60,
            "resources": [
                {{"name": "Resource Name", "url": "https://www.youtube.com/results?search_query=TOPIC+tutorial", "type": "free", "platform": "YouTube"}}
            ]
        }}
    ],
    "roadmap": {{
        "phases": [
            {{
                "name": "Phase name",
                "weeks": "1-2",
                "focus": "What to focus on",
                "milestones": ["milestone1", "milestone2"]
            }}
        ]
    }},
    "schedule": {{
        "daily_plan": "Description of ideal daily learning schedule considering the student's routine",
        "weekly_structure": "How weeks are organized",
        "tips": ["study tip 1", "study tip 2"]
    }},
    "resources": {{
        "free": [
            {{"name": "Resource name", "url": "https://www.youtube.com/results?search_query=TOPIC+tutorial", "platform": "YouTube", "description": "Brief desc"}}
        ],
        "paid": []
    }}
}}

GENERAL RULES:
- Create at least {min_topics} individual topics spread across the weeks
- Consider the student's educational background and adjust complexity
- Consider their hobbies and daily routine when suggesting study times
- Make topics progressive - build on previous knowledge
- Return ONLY valid JSON, no markdown code blocks or extra text
"#,
        subject = params.subject,
        level = params.level,
        weeks = params.duration_weeks,
        hours = params.daily_hours,
        reason = reason,
        age = profile.age_text(),
        qualification =
            LearnerProfile::text_or_default(&profile.educational_qualification, "Not specified"),
        interests =
            LearnerProfile::text_or_default(&profile.educational_interests, "Not specified"),
        hobbies = LearnerProfile::text_or_default(&profile.hobbies, "Not specified"),
        habits = LearnerProfile::text_or_default(&profile.habits, "Not specified"),
        routine = LearnerProfile::text_or_default(&profile.daily_routine, "Not specified"),
        ongoing = LearnerProfile::text_or_default(&profile.ongoing_courses, "None"),
        min_topics = min_topics,
    );

    match policy {
        ResourcePolicy::FreeOnly => prompt.push_str(
            r#"
RESOURCE URL RULES (follow strictly):
- ALL resources must be FREE and accessible WITHOUT any login or account
- NEVER invent or guess a specific article/course URL - they may not exist
- ONLY use these approved URL patterns (replace TOPIC with url-encoded topic keywords):
  * YouTube search: https://www.youtube.com/results?search_query=TOPIC+tutorial
  * freeCodeCamp search: https://www.freecodecamp.org/news/search/?query=TOPIC
  * W3Schools (for web/programming): https://www.w3schools.com/LANGUAGE/ (e.g. /python/, /js/, /sql/)
  * MDN Web Docs: https://developer.mozilla.org/en-US/search?q=TOPIC
  * MIT OpenCourseWare: https://ocw.mit.edu/search/?q=TOPIC
  * GeeksforGeeks: https://www.geeksforgeeks.org/TOPIC/ (use main topic page only)
  * Wikipedia: https://en.wikipedia.org/wiki/TOPIC
  * GitHub search: https://github.com/search?q=TOPIC+tutorial
  * The Odin Project: https://www.theodinproject.com/ (homepage only)
  * CS50 Harvard: https://cs50.harvard.edu/ (homepage only)
  * Khan Academy: https://www.khanacademy.org/search?page_search_query=TOPIC
- Do NOT include any paid platforms (Udemy, Coursera, DataCamp, Pluralsight, LinkedIn Learning)
- Each topic should have 1-2 resource links using the above patterns
"#,
        ),
        ResourcePolicy::AllowPaid => prompt.push_str(
            r#"
RESOURCE RULES:
- Recommend the best available resources for each topic, free or paid
- For paid resources, include a "price" field with an approximate USD price
- Fill both the "free" and "paid" buckets in the top-level resources object
- Each topic should have 1-2 resource links
"#,
        ),
    }

    prompt
}

/// Drops resource entries whose URL is unparseable or points off the
/// allow-list, and empties the paid bucket. Applied only under `FreeOnly`.
fn scrub_resources(plan: &mut Value) {
    if let Some(topics) = plan.get_mut("topics").and_then(Value::as_array_mut) {
        for topic in topics {
            if let Some(resources) = topic.get_mut("resources").and_then(Value::as_array_mut) {
                resources.retain(resource_is_approved);
            }
        }
    }

    if let Some(buckets) = plan.get_mut("resources") {
        if let Some(free) = buckets.get_mut("free").and_then(Value::as_array_mut) {
            free.retain(resource_is_approved);
        }
        if let Some(paid) = buckets.get_mut("paid") {
            *paid = json!([]);
        }
    }
}

fn resource_is_approved(resource: &Value) -> bool {
    let Some(url) = resource.get("url").and_then(Value::as_str) else {
        return false;
    };
    let Ok(parsed) = Url::parse(url) else {
        return false;
    };
    let Some(host) = parsed.host_str() else {
        return false;
    };

    APPROVED_RESOURCE_DOMAINS
        .iter()
        .any(|domain| host == *domain || host.ends_with(&format!(".{}", domain)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::GenerationError;
    use async_trait::async_trait;

    struct CannedGenerator(Result<String, GenerationError>);

    #[async_trait]
    impl TextGenerator for CannedGenerator {
        async fn complete(
            &self,
            _prompt: &str,
            _max_tokens: u32,
            _temperature: f32,
        ) -> Result<String, GenerationError> {
            match &self.0 {
                Ok(text) => Ok(text.clone()),
                Err(GenerationError::Request(msg)) => Err(GenerationError::Request(msg.clone())),
                Err(GenerationError::Api { status, message }) => Err(GenerationError::Api {
                    status: *status,
                    message: message.clone(),
                }),
                Err(GenerationError::EmptyReply) => Err(GenerationError::EmptyReply),
            }
        }
    }

    fn params() -> EnrollmentParams<'static> {
        EnrollmentParams {
            subject: "Rust",
            level: "beginner",
            reason: "",
            duration_weeks: 4,
            daily_hours: 1.5,
        }
    }

    #[test]
    fn prompt_requests_topic_minimum() {
        let prompt = build_prompt(&params(), &LearnerProfile::default(), ResourcePolicy::FreeOnly);
        assert!(prompt.contains("at least 20 individual topics"));
        assert!(prompt.contains("**Subject:** Rust"));
        assert!(prompt.contains("Reason for learning:** General interest"));
    }

    #[test]
    fn free_only_prompt_carries_allow_list() {
        let prompt = build_prompt(&params(), &LearnerProfile::default(), ResourcePolicy::FreeOnly);
        assert!(prompt.contains("https://www.youtube.com/results?search_query=TOPIC+tutorial"));
        assert!(prompt.contains("Do NOT include any paid platforms"));
    }

    #[test]
    fn allow_paid_prompt_permits_prices() {
        let prompt =
            build_prompt(&params(), &LearnerProfile::default(), ResourcePolicy::AllowPaid);
        assert!(prompt.contains("\"price\" field"));
        assert!(!prompt.contains("Do NOT include any paid platforms"));
    }

    #[test]
    fn scrub_drops_off_list_hosts_and_empties_paid() {
        let mut plan = json!({
            "topics": [{
                "title": "Intro",
                "resources": [
                    {"name": "ok", "url": "https://www.youtube.com/results?search_query=rust"},
                    {"name": "bad", "url": "https://www.udemy.com/course/rust/"},
                    {"name": "broken", "url": "not a url"}
                ]
            }],
            "resources": {
                "free": [
                    {"name": "wiki", "url": "https://en.wikipedia.org/wiki/Rust"},
                    {"name": "paid-ish", "url": "https://www.coursera.org/learn/rust"}
                ],
                "paid": [{"name": "course", "url": "https://www.udemy.com/x"}]
            }
        });

        scrub_resources(&mut plan);

        let topic_resources = plan["topics"][0]["resources"].as_array().unwrap();
        assert_eq!(topic_resources.len(), 1);
        assert_eq!(topic_resources[0]["name"], "ok");

        let free = plan["resources"]["free"].as_array().unwrap();
        assert_eq!(free.len(), 1);
        assert_eq!(free[0]["name"], "wiki");

        assert!(plan["resources"]["paid"].as_array().unwrap().is_empty());
    }

    #[test]
    fn topics_from_applies_defaults() {
        let plan = json!({
            "topics": [
                {"week": 2, "day": 3, "title": "Ownership", "description": "moves", "duration_minutes": 90},
                {"description": "untitled entry"},
                "not an object"
            ]
        });

        let topics = topics_from(&plan);
        assert_eq!(topics.len(), 2);
        assert_eq!(topics[0].week, 2);
        assert_eq!(topics[0].duration_minutes, 90);
        assert_eq!(topics[1].week, 1);
        assert_eq!(topics[1].day, 2);
        assert_eq!(topics[1].title, "Topic 2");
        assert_eq!(topics[1].duration_minutes, 60);
    }

    #[test]
    fn topics_from_missing_array_is_empty() {
        assert!(topics_from(&json!({"title": "x"})).is_empty());
    }

    #[tokio::test]
    async fn generator_failure_becomes_error_object() {
        let generator = CannedGenerator(Err(GenerationError::EmptyReply));
        let plan = generate_curriculum(
            &generator,
            ResourcePolicy::FreeOnly,
            &params(),
            &LearnerProfile::default(),
        )
        .await;

        assert!(plan.get("error").is_some());
        assert!(plan.get("title").is_none());
    }

    #[tokio::test]
    async fn unparseable_reply_keeps_excerpt() {
        let generator = CannedGenerator(Ok("total garbage, no json here".to_string()));
        let plan = generate_curriculum(
            &generator,
            ResourcePolicy::FreeOnly,
            &params(),
            &LearnerProfile::default(),
        )
        .await;

        assert!(plan.get("error").is_some());
        assert_eq!(plan["raw_response"], "total garbage, no json here");
    }

    #[tokio::test]
    async fn good_reply_passes_through_scrubbed() {
        let generator = CannedGenerator(Ok(r#"```json
        {"title": "Rust Basics", "topics": [{"title": "Intro", "resources": [{"url": "https://www.pluralsight.com/x"}]}]}
        ```"#
            .to_string()));
        let plan = generate_curriculum(
            &generator,
            ResourcePolicy::FreeOnly,
            &params(),
            &LearnerProfile::default(),
        )
        .await;

        assert_eq!(plan["title"], "Rust Basics");
        assert!(plan["topics"][0]["resources"].as_array().unwrap().is_empty());
    }
}
