//! Root page handler - upload form

use axum::{
    http::{header, HeaderMap},
    response::{Html, IntoResponse, Response},
};
use recmerge_common::encoding::{supported_encodings, DEFAULT_ENCODING};
use recmerge_common::format::BUNDLE_EXTENSION;
use recmerge_common::{InputFormat, LineEnding, OutputFormat};

use super::layout::{escape_html, page};
use crate::session;

/// GET /
///
/// Upload form; shows and clears any pending flash message
pub async fn root_page(headers: HeaderMap) -> Response {
    let flash = session::flash_message(&headers);
    let html = render_upload_form(flash.as_deref());

    if flash.is_some() {
        ([(header::SET_COOKIE, session::clear_flash_cookie())], Html(html)).into_response()
    } else {
        Html(html).into_response()
    }
}

pub fn render_upload_form(flash: Option<&str>) -> String {
    let flash_html = flash
        .map(|message| format!(r#"<div class="flash">{}</div>"#, escape_html(message)))
        .unwrap_or_default();

    let encodings: String = supported_encodings()
        .into_iter()
        .map(|(key, name)| {
            let selected = if key == DEFAULT_ENCODING { " selected" } else { "" };
            format!(
                r#"<option value="{}"{}>{}</option>"#,
                key,
                selected,
                escape_html(name)
            )
        })
        .collect();

    let mut input_formats = String::from(r#"<option value="">Detect from file name</option>"#);
    for format in InputFormat::ALL {
        input_formats.push_str(&format!(r#"<option value="{0}">{0}</option>"#, format.as_str()));
    }
    input_formats.push_str(&format!(
        r#"<option value="{0}">{0} (pre-processed master)</option>"#,
        BUNDLE_EXTENSION
    ));

    let output_formats: String = OutputFormat::ALL
        .iter()
        .map(|f| format!(r#"<option value="{0}">{0}</option>"#, f.as_str()))
        .collect();

    let line_endings: String = LineEnding::ALL
        .iter()
        .map(|l| format!(r#"<option value="{0}">{0}</option>"#, l.as_str()))
        .collect();

    let body = format!(
        r#"{flash_html}
        <form method="post" action="/run" enctype="multipart/form-data">
            <fieldset>
                <legend>Files</legend>
                <label for="master">Master file (or .{bundle} bundle)</label>
                <input type="file" id="master" name="master" required>
                <label for="incoming">Incoming file</label>
                <input type="file" id="incoming" name="incoming" required>
                <label for="profile">Profile (not needed with a bundle)</label>
                <input type="file" id="profile" name="profile">
                <label for="input_format">Input format</label>
                <select id="input_format" name="input_format">{input_formats}</select>
                <label for="input_encoding">Input encoding</label>
                <select id="input_encoding" name="input_encoding">{encodings}</select>
            </fieldset>
            <fieldset>
                <legend>Matching</legend>
                <label for="primary_key">Master primary key column</label>
                <input type="text" id="primary_key" name="primary_key">
                <label for="cutoff">Score cutoff</label>
                <input type="number" id="cutoff" name="cutoff" min="0" value="0">
                <label for="nresults">Candidates per record (0 = all)</label>
                <input type="number" id="nresults" name="nresults" min="0" value="5">
            </fieldset>
            <fieldset>
                <legend>Output</legend>
                <label for="output_format">Output format</label>
                <select id="output_format" name="output_format">{output_formats}</select>
                <label for="output_encoding">Output encoding</label>
                <select id="output_encoding" name="output_encoding">{encodings}</select>
                <label for="line_endings">Line endings</label>
                <select id="line_endings" name="line_endings">{line_endings}</select>
            </fieldset>
            <fieldset>
                <legend>Options</legend>
                <div><input type="checkbox" id="display_diff" name="display_diff"><label class="inline" for="display_diff">Highlight differences</label></div>
                <div><input type="checkbox" id="include_unmatched_records" name="include_unmatched_records"><label class="inline" for="include_unmatched_records">Include unmatched records</label></div>
                <div><input type="checkbox" id="output_only_modified_entries" name="output_only_modified_entries"><label class="inline" for="output_only_modified_entries">Output only modified entries</label></div>
                <div><input type="checkbox" id="include_re_new_address_flag" name="include_re_new_address_flag"><label class="inline" for="include_re_new_address_flag">Include new address flag</label></div>
            </fieldset>
            <button type="submit">Compare</button>
        </form>"#,
        flash_html = flash_html,
        bundle = BUNDLE_EXTENSION,
        input_formats = input_formats,
        encodings = encodings,
        output_formats = output_formats,
        line_endings = line_endings,
    );

    page("Record Merge", "Upload a master and an incoming file", &body)
}
