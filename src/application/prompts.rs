use crate::domain::models::{FinancialAdviceRequest, UserProfile};
use chrono::NaiveDate;

pub const NEWS_ITEM_COUNT: usize = 6;

const TODOS_SHAPE: &str = r#"{
  "todos": [
    {
      "title": "Brief title",
      "description": "Detailed description of the task",
      "timeFrame": "Suggested time of day or duration"
    }
  ]
}"#;

const NEWS_SHAPE: &str = r#"{
  "news": [
    {
      "id": "1",
      "title": "Headline",
      "summary": "Two or three sentence summary",
      "source": "Publication name",
      "publishedAt": "YYYY-MM-DD",
      "url": "https://example.com/article"
    }
  ]
}"#;

const ADVICE_SHAPE: &str = r#"{
  "advice": {
    "budgetBreakdown": [
      { "category": "Housing", "percentage": 30, "amount": 1500, "description": "Why this share" }
    ],
    "investmentRecommendations": [
      { "type": "Index funds", "percentage": 60, "description": "What and why", "riskLevel": "Low | Medium | High" }
    ],
    "savingsGoals": [
      { "goal": "Emergency fund", "timeline": "12 months", "monthlyAmount": 400, "description": "How to get there" }
    ],
    "tips": ["Short actionable tip"]
  }
}"#;

/// Long-form English date, e.g. "Wednesday, May 1, 2024".
pub fn long_date(date: NaiveDate) -> String {
    date.format("%A, %B %-d, %Y").to_string()
}

pub fn routine_prompt(profile: &UserProfile, description: &str, date: NaiveDate) -> String {
    format!(
        "You are a personal routine assistant for {name}, who is {age} years old and works as a {occupation}.\n\n\
         Based on the following daily routine description, create a list of 5-7 specific todo items for {date}.\n\n\
         Daily routine description: \"{description}\"\n\n\
         Format your response as a JSON object with the following structure:\n{shape}\n\n\
         Provide practical, actionable items that can be completed within the day.",
        name = profile.name,
        age = profile.age,
        occupation = profile.occupation,
        date = long_date(date),
        description = description.trim(),
        shape = TODOS_SHAPE,
    )
}

pub fn news_prompt(today: NaiveDate) -> String {
    format!(
        "You are a financial news assistant. As of {date}, list the {count} most relevant recent \
         financial market news items for a general audience.\n\n\
         Format your response as a JSON object with the following structure:\n{shape}\n\n\
         Keep summaries factual and concise. Omit \"url\" when you do not know a real link.",
        date = long_date(today),
        count = NEWS_ITEM_COUNT,
        shape = NEWS_SHAPE,
    )
}

pub fn advice_prompt(profile: &UserProfile, request: &FinancialAdviceRequest) -> String {
    let mut situation = vec![
        format!("- Monthly income: {:.2}", request.monthly_income),
        format!("- Monthly expenses: {:.2}", request.monthly_expenses),
    ];
    if let Some(breakdown) = non_blank(request.expense_breakdown.as_deref()) {
        situation.push(format!("- Expense breakdown: {breakdown}"));
    }
    if let Some(goals) = non_blank(request.financial_goals.as_deref()) {
        situation.push(format!("- Financial goals: {goals}"));
    }

    format!(
        "You are a personal finance advisor for {name}, who is {age} years old and works as a {occupation}.\n\n\
         Their current financial situation:\n{situation}\n\n\
         Suggest a monthly budget breakdown, investment recommendations, savings goals and practical tips.\n\n\
         Format your response as a JSON object with the following structure:\n{shape}\n\n\
         Percentages in the budget breakdown should add up to 100 and amounts should be based on the monthly income.",
        name = profile.name,
        age = profile.age,
        occupation = profile.occupation,
        situation = situation.join("\n"),
        shape = ADVICE_SHAPE,
    )
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}
