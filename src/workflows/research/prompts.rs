use crate::workflows::assessment::AssessmentInput;

use super::providers::SearchHit;

pub(crate) const ANALYST_SYSTEM: &str = "You are a research analyst for a construction-software sales team. \
Work only from the material provided. Answer with valid JSON matching the requested shape and nothing else. \
When the material does not support a field, use an empty list or null rather than guessing.";

pub(crate) const SALES_SYSTEM: &str = "You are a sales strategist for a construction-software vendor. \
Every point you produce must name the source it came from (website, search result, knowledge base, or intake form). \
Answer with valid JSON matching the requested shape and nothing else.";

/// Caps a text block before it goes into a prompt.
pub(crate) fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let kept: String = text.chars().take(max_chars).collect();
    format!("{kept}…")
}

pub(crate) fn basic_info_prompt(company: &str, trade: &str, hits: &[SearchHit]) -> String {
    let mut prompt = String::with_capacity(2048);
    prompt.push_str("Extract basic company facts from these web search results.\n\n");
    prompt.push_str(&format!("Company: {company}\nTrade: {trade}\n\nSearch results:\n"));
    for (index, hit) in hits.iter().enumerate() {
        prompt.push_str(&format!(
            "{}. {} ({})\n   {}\n",
            index + 1,
            hit.title,
            hit.url,
            truncate(&hit.description, 400)
        ));
    }
    prompt.push_str(
        "\nRespond with JSON: {\"description\": string|null, \"services\": [string], \
\"location\": string|null, \"yearsInBusiness\": string|null, \"sizeEstimate\": string|null}",
    );
    prompt
}

pub(crate) fn website_analysis_prompt(company: &str, content: &str) -> String {
    let mut prompt = String::with_capacity(8192);
    prompt.push_str(&format!(
        "Analyze the website content of {company}, a construction trade contractor.\n\n"
    ));
    prompt.push_str("Website content:\n");
    prompt.push_str(&truncate(content, 6000));
    prompt.push_str(
        "\n\nRespond with JSON: {\"technologies\": [string], \"services\": [string], \
\"valuePropositions\": [string], \"painPoints\": [string], \
\"companyHistory\": {\"founded\": string|null, \"milestones\": [string], \"ownership\": string|null}}\n\
painPoints means operational problems the site hints at, not marketing copy.",
    );
    prompt
}

pub(crate) fn competitor_synthesis_prompt(
    company: &str,
    trade: &str,
    materials: &[(String, String)],
) -> String {
    let mut prompt = String::with_capacity(8192);
    prompt.push_str(&format!(
        "Profile the competitors of {company}, a {trade} contractor, from the material below.\n\n"
    ));
    for (source, content) in materials {
        prompt.push_str(&format!("--- {source} ---\n{}\n\n", truncate(content, 3000)));
    }
    prompt.push_str(
        "Respond with JSON: {\"competitors\": [{\"name\": string, \"url\": string|null, \
\"positioning\": string|null, \"strengths\": [string], \"weaknesses\": [string]}], \
\"positioningSummary\": string}",
    );
    prompt
}

pub(crate) fn industry_synthesis_prompt(trade: &str, materials: &[(String, String)]) -> String {
    let mut prompt = String::with_capacity(8192);
    prompt.push_str(&format!(
        "Summarize the current state of the {trade} contracting industry from the material below.\n\n"
    ));
    for (source, content) in materials {
        prompt.push_str(&format!("--- {source} ---\n{}\n\n", truncate(content, 3000)));
    }
    prompt.push_str(
        "Respond with JSON: {\"trends\": [string], \"challenges\": [string], \
\"opportunities\": [string], \"marketSize\": string|null}",
    );
    prompt
}

pub(crate) fn tooling_analysis_prompt(trade: &str, tools: &[String]) -> String {
    let mut prompt = String::with_capacity(2048);
    prompt.push_str(&format!(
        "A {trade} contractor currently runs their operation on these tools: {}.\n\n",
        tools.join(", ")
    ));
    prompt.push_str(
        "Assess each tool and the stack as a whole from an operations standpoint.\n\
Respond with JSON: {\"tools\": [{\"name\": string, \"category\": string|null, \
\"limitations\": [string]}], \"gaps\": [string], \"switchingConsiderations\": [string]}",
    );
    prompt
}

pub(crate) fn knowledge_insights_prompt(
    company: &str,
    trade: &str,
    raw_blocks: &[(String, String)],
) -> String {
    let mut prompt = String::with_capacity(8192);
    prompt.push_str(&format!(
        "Below are raw knowledge-base records about customers similar to {company} ({trade}).\n\n"
    ));
    for (query, results) in raw_blocks {
        prompt.push_str(&format!(
            "--- query: {query} ---\n{}\n\n",
            truncate(results, 3000)
        ));
    }
    prompt.push_str(
        "Extract what is useful for a sales conversation. Attribute every insight to the record \
it came from.\nRespond with JSON: {\"similarCustomers\": [string], \"caseStudies\": [string], \
\"insights\": [{\"insight\": string, \"source\": string}]}",
    );
    prompt
}

pub(crate) fn sales_intelligence_prompt(input: &AssessmentInput, research_json: &str) -> String {
    let mut prompt = String::with_capacity(16_384);
    prompt.push_str("Produce sales intelligence for the prospect described below.\n\n");
    prompt.push_str("Intake form:\n");
    prompt.push_str(&format!(
        "- company: {}\n- trade: {}\n- crew size: {}\n- urgency: {}/10\n- purchase likelihood: {}/10\n\
- decision timeline: {}\n- weekly admin hours: {}\n- declared pain points: {}\n- current tools: {}\n\
- competitors evaluated: {}\n\n",
        input.company_name,
        input.trade.label(),
        input.crew_size.label(),
        input.bounded_urgency(),
        input.bounded_likelihood(),
        input.timeline.label(),
        input.admin_hours.label(),
        join_or_none(&input.pain_points),
        join_or_none(&input.current_tools),
        join_or_none(&input.competitors),
    ));
    prompt.push_str("Assembled research:\n");
    prompt.push_str(&truncate(research_json, 9000));
    prompt.push_str(
        "\n\nEvery point must carry a \"source\" naming where it came from.\n\
Respond with JSON: {\"talkingPoints\": [{\"point\": string, \"source\": string}], \
\"objections\": [{\"objection\": string, \"response\": string, \"source\": string}], \
\"competitiveAdvantages\": [{\"point\": string, \"source\": string}], \
\"buyingSignals\": [{\"point\": string, \"source\": string}], \
\"risks\": [{\"point\": string, \"source\": string}], \
\"keyContacts\": [{\"name\": string|null, \"role\": string, \"rationale\": string|null, \
\"decisionMaker\": bool}]}",
    );
    prompt
}

fn join_or_none(items: &[String]) -> String {
    if items.is_empty() {
        "none".to_string()
    } else {
        items.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_marks_the_cut() {
        let long = "a".repeat(50);
        let cut = truncate(&long, 10);
        assert!(cut.starts_with("aaaaaaaaaa"));
        assert!(cut.ends_with('…'));
        assert_eq!(truncate("short", 10), "short");
    }

    #[test]
    fn basic_info_prompt_numbers_the_hits() {
        let hits = vec![
            SearchHit {
                url: "https://acme.test".to_string(),
                title: "Acme Roofing".to_string(),
                description: "Commercial roofing in Des Moines".to_string(),
            },
            SearchHit {
                url: "https://directory.test/acme".to_string(),
                title: "Acme Roofing | Directory".to_string(),
                description: "Founded 1998".to_string(),
            },
        ];
        let prompt = basic_info_prompt("Acme Roofing", "roofing", &hits);
        assert!(prompt.contains("1. Acme Roofing (https://acme.test)"));
        assert!(prompt.contains("2. Acme Roofing | Directory"));
        assert!(prompt.contains("\"yearsInBusiness\""));
    }
}
