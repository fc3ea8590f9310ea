use std::fmt;

use serde::Serialize;

/// Closed exercise taxonomy. Ordering of variants matches rule precedence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum ExerciseCategory {
    Running,
    Strength,
    Yoga,
    Swimming,
    Cycling,
    Walking,
    BallSports,
    Hiking,
    Other,
}

impl ExerciseCategory {
    pub fn label(&self) -> &'static str {
        match self {
            ExerciseCategory::Running => "running",
            ExerciseCategory::Strength => "strength",
            ExerciseCategory::Yoga => "yoga",
            ExerciseCategory::Swimming => "swimming",
            ExerciseCategory::Cycling => "cycling",
            ExerciseCategory::Walking => "walking",
            ExerciseCategory::BallSports => "ball sports",
            ExerciseCategory::Hiking => "hiking",
            ExerciseCategory::Other => "other",
        }
    }
}

impl fmt::Display for ExerciseCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone)]
pub struct CategoryRule {
    pub category: ExerciseCategory,
    /// Lowercase substrings; any hit assigns the category.
    pub keywords: Vec<String>,
}

/// Maps free-text check-in content onto the taxonomy. First matching rule
/// wins; no match falls through to `Other`. The rule list is data, tuned for
/// the Korean-language check-ins the source feeds us, not logic.
#[derive(Debug, Clone)]
pub struct ExerciseCategorizer {
    rules: Vec<CategoryRule>,
}

impl Default for ExerciseCategorizer {
    fn default() -> Self {
        Self::new(default_rules())
    }
}

impl ExerciseCategorizer {
    pub fn new(rules: Vec<CategoryRule>) -> Self {
        Self { rules }
    }

    pub fn categorize(&self, content: &str) -> ExerciseCategory {
        let lowered = content.to_lowercase();
        for rule in &self.rules {
            if rule
                .keywords
                .iter()
                .any(|keyword| lowered.contains(keyword.as_str()))
            {
                return rule.category;
            }
        }
        ExerciseCategory::Other
    }
}

fn rule(category: ExerciseCategory, keywords: &[&str]) -> CategoryRule {
    CategoryRule {
        category,
        keywords: keywords.iter().map(|k| k.to_string()).collect(),
    }
}

fn default_rules() -> Vec<CategoryRule> {
    vec![
        rule(
            ExerciseCategory::Running,
            &["러닝", "달리기", "조깅", "마라톤", "running", "jog"],
        ),
        rule(
            ExerciseCategory::Strength,
            &[
                "헬스", "웨이트", "근력", "스쿼트", "데드리프트", "벤치", "gym", "weight",
                "strength", "lifting",
            ],
        ),
        rule(
            ExerciseCategory::Yoga,
            &["요가", "필라테스", "스트레칭", "yoga", "pilates", "stretch"],
        ),
        rule(ExerciseCategory::Swimming, &["수영", "swim"]),
        rule(
            ExerciseCategory::Cycling,
            &["자전거", "사이클", "따릉이", "스피닝", "cycling", "bike", "spinning"],
        ),
        rule(
            ExerciseCategory::Walking,
            &["걷기", "산책", "워킹", "만보", "walk"],
        ),
        rule(
            ExerciseCategory::BallSports,
            &[
                "축구", "풋살", "농구", "야구", "테니스", "배드민턴", "탁구", "골프", "soccer",
                "futsal", "basketball", "baseball", "tennis", "badminton", "golf",
            ],
        ),
        rule(
            ExerciseCategory::Hiking,
            &["등산", "하이킹", "클라이밍", "hiking", "climbing"],
        ),
    ]
}
