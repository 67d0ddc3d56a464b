//! JQL query and search URL construction

use url::form_urlencoded;

use crate::model::TicketFilter;

/// Ticket fields read from search results
pub const SEARCH_FIELDS: &str =
    "id,key,created,resolutiondate,updated,issuetype,status,assignee,resolution,versions,fixVersions";

/// Build the JQL selecting a project's tickets under `filter`
pub fn build_jql(project: &str, filter: &TicketFilter) -> String {
    let mut jql = format!("project=\"{}\"", project);

    append_clause(&mut jql, "status", filter.statuses.iter().map(|s| s.as_str()));
    append_clause(&mut jql, "issueType", filter.types.iter().map(|t| t.as_str()));
    append_clause(&mut jql, "resolution", filter.resolutions.iter().map(|r| r.as_str()));

    jql
}

fn append_clause<'a>(jql: &mut String, field: &str, values: impl Iterator<Item = &'a str>) {
    let terms: Vec<String> = values.map(|v| format!("{}=\"{}\"", field, v)).collect();
    if terms.is_empty() {
        return;
    }
    jql.push_str(" AND (");
    jql.push_str(&terms.join(" OR "));
    jql.push(')');
}

/// Search URL for one page of results
pub fn search_url(base_url: &str, jql: &str, start_at: usize, page_size: usize) -> String {
    let query = form_urlencoded::Serializer::new(String::new())
        .append_pair("jql", jql)
        .append_pair("fields", SEARCH_FIELDS)
        .append_pair("startAt", &start_at.to_string())
        .append_pair("maxResults", &page_size.to_string())
        .finish();
    format!("{}search?{}", base_url, query)
}

/// Release listing URL for a project
pub fn versions_url(base_url: &str, project: &str) -> String {
    let key: String = form_urlencoded::byte_serialize(project.to_uppercase().as_bytes()).collect();
    format!("{}project/{}/versions", base_url, key)
}
