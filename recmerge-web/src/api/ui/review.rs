//! Review page - ranked candidates per incoming line
//!
//! Rendered directly by `POST /run`; the page's form posts to `/dl`. Control
//! names come from [`FieldKey`] so the resolution step can address them back.

use std::collections::HashMap;

use recmerge_common::MatchGroup;

use super::layout::{escape_html, page};
use crate::field_key::FieldKey;
use crate::merge::FieldChoice;
use crate::operation::Operation;

pub fn render_review(op: &Operation) -> String {
    let header_mapping = op.profile.header_mapping();
    let columns: Vec<&String> = op
        .incoming
        .headers()
        .iter()
        .filter(|h| **h != op.primary_key)
        .collect();

    let mut body = String::new();
    if op.results.is_empty() {
        body.push_str(r#"<p>No candidate matches were found for any incoming record.</p>"#);
    }

    body.push_str(r#"<form method="post" action="/dl">"#);
    for group in &op.results {
        body.push_str(&render_group(op, group, &columns, &header_mapping));
    }
    body.push_str(r#"<button type="submit">Download merged file</button></form>"#);

    let subtitle = format!(
        "{} incoming records, {} with candidates",
        op.incoming.len(),
        op.results.len()
    );
    page("Review Matches", &subtitle, &body)
}

fn render_group(
    op: &Operation,
    group: &MatchGroup,
    columns: &[&String],
    header_mapping: &HashMap<String, String>,
) -> String {
    let line = group.input_line;
    let match_name = FieldKey::master_choice(line).encode();
    let Some(top) = group.top() else {
        return String::new();
    };
    let incoming = &top.incoming;

    let mut html = format!(
        r#"<div class="match-group"><h2>Incoming line {}</h2><table class="review"><tr><th>Match</th><th>Score</th>"#,
        line
    );
    for column in columns {
        html.push_str(&format!("<th>{}</th>", escape_html(column)));
    }
    html.push_str("</tr>");

    html.push_str(&format!(
        r#"<tr class="incoming"><td><input type="radio" name="{}" value="" checked> No match</td><td></td>"#,
        match_name
    ));
    for column in columns {
        html.push_str(&format!("<td>{}</td>", escape_html(incoming.value(column))));
    }
    html.push_str("</tr>");

    // A blank id would submit as "No match"
    for candidate in group.candidates.iter().filter(|c| !c.master_id.is_empty()) {
        let id = &candidate.master_id;
        html.push_str(&format!(
            r#"<tr><td><input type="radio" name="{}" value="{}"> {}</td><td class="score">{:.3}</td>"#,
            match_name,
            escape_html(id),
            escape_html(id),
            candidate.score
        ));

        for column in columns {
            let master_value = header_mapping
                .get(column.as_str())
                .map(|master_column| candidate.master.value(master_column));
            let differs = op.options.display_diff
                && master_value.map_or(false, |v| v != incoming.value(column));

            html.push_str(&format!(
                r#"<td{}>{}<div class="field-choice">{}</div></td>"#,
                if differs { r#" class="diff""# } else { "" },
                escape_html(master_value.unwrap_or("")),
                field_controls(line, id, column, master_value.is_some()),
            ));
        }
        html.push_str("</tr>");
    }
    html.push_str("</table>");

    if op.options.include_re_new_address_flag {
        html.push_str(&format!(
            r#"<p><input type="checkbox" id="{0}" name="{0}"><label class="inline" for="{0}">New address</label></p>"#,
            FieldKey::new_address(line).encode()
        ));
    }
    html.push_str("</div>");
    html
}

/// Choice select plus free-text box for one candidate field
fn field_controls(line: usize, record_id: &str, column: &str, mapped: bool) -> String {
    let mut options = format!(
        r#"<option value="{}" selected>Keep incoming</option>"#,
        FieldChoice::Incoming.as_str()
    );
    if mapped {
        options.push_str(&format!(
            r#"<option value="{}">Use master</option>"#,
            FieldChoice::Master.as_str()
        ));
    }
    options.push_str(&format!(
        r#"<option value="{}">Enter value</option>"#,
        FieldChoice::User.as_str()
    ));

    format!(
        r#"<select name="{}">{}</select><input type="text" name="{}" placeholder="New value">"#,
        FieldKey::field_choice(line, record_id, column).encode(),
        options,
        FieldKey::user_entry(line, record_id, column).encode(),
    )
}
