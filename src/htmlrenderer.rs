//! Implements a custom [`push_html`] for post bodies. Compared with
//! [`pulldown_cmark::html::push_html`] this gives every heading an `id`
//! anchor (and records it for the table of contents), wraps fenced code
//! blocks in a header naming the language, rewrites internal links, and opens
//! external links in a new tab.

use crate::url::Converter as LinkConverter;
use pulldown_cmark::escape::{escape_href, escape_html, StrWrite};
use pulldown_cmark::{Alignment, CodeBlockKind, CowStr, Event, LinkType, Tag};
use regex::Regex;
use serde::Serialize;
use std::collections::HashSet;
use std::io;
use std::sync::LazyLock;

/// An entry in a post's table of contents.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Heading {
    /// The heading level, 1 through 6.
    pub level: u32,

    /// The plain text of the heading.
    pub text: String,

    /// The anchor id written onto the heading element.
    pub id: String,
}

/// Derives an anchor id from heading text: lowercased, stripped of anything
/// but word characters, whitespace and `-`, with whitespace runs turned into
/// `-`.
pub fn heading_id(text: &str) -> String {
    static RE_STRIP: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^\w\s-]").unwrap());
    static RE_SPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

    let lower = text.trim().to_lowercase();
    let stripped = RE_STRIP.replace_all(&lower, "");
    RE_SPACE.replace_all(stripped.trim(), "-").into_owned()
}

enum TableState {
    Head,
    Body,
}

// A heading whose contents are being buffered until its end tag, when the id
// can be computed from its full text.
struct OpenHeading {
    level: u32,
    html: String,
    text: String,
}

/// Renders markdown [`Event`]s into HTML. This is largely modeled after
/// [`pulldown_cmark`]'s private `HtmlWriter` struct.
struct HtmlRenderer<'c> {
    table_alignments: Vec<Alignment>,
    table_state: TableState,
    table_cell_index: usize,

    /// Rewrites link destinations (e.g. `other-post.mdx`).
    link_converter: &'c LinkConverter,

    heading: Option<OpenHeading>,
    headings: Vec<Heading>,
    seen_ids: HashSet<String>,

    /// Non-zero while inside an image, whose contents become its alt text.
    image_depth: usize,
}

impl<'a, 'c> HtmlRenderer<'c> {
    fn new(link_converter: &'c LinkConverter) -> Self {
        HtmlRenderer {
            table_alignments: Vec::default(),
            table_state: TableState::Head,
            table_cell_index: usize::default(),
            link_converter,
            heading: None,
            headings: Vec::new(),
            seen_ids: HashSet::new(),
            image_depth: 0,
        }
    }

    fn on_event<W: StrWrite>(&mut self, w: &mut W, event: Event<'a>) -> io::Result<()> {
        match self.heading.take() {
            Some(mut heading) => {
                if let Event::End(Tag::Heading(_)) = event {
                    return self.close_heading(w, heading);
                }
                if let Event::Text(ref text) | Event::Code(ref text) = event {
                    heading.text.push_str(text);
                }
                let result = self.render(&mut heading.html, event);
                self.heading = Some(heading);
                result
            }
            None => self.render(w, event),
        }
    }

    fn render<W: StrWrite>(&mut self, w: &mut W, event: Event<'a>) -> io::Result<()> {
        if self.image_depth > 0 {
            return self.render_alt_text(w, event);
        }
        match event {
            Event::Start(tag) => self.on_start(w, tag),
            Event::End(tag) => self.on_end(w, tag),
            Event::Code(code) => {
                w.write_str(r#"<code class="inline-code">"#)?;
                escape_html(&mut *w, &code)?;
                w.write_str("</code>")
            }
            Event::FootnoteReference(name) => {
                w.write_str(r##"<sup class="footnote-reference"><a href="#"##)?;
                escape_html(&mut *w, &name)?;
                w.write_str(r#"">"#)?;
                escape_html(&mut *w, &name)?;
                w.write_str("</a></sup>")
            }
            Event::HardBreak => w.write_str("<br />"),
            Event::Html(html) => w.write_str(&html),
            Event::Rule => w.write_str("<hr />"),
            Event::SoftBreak => w.write_str("\n"),
            Event::TaskListMarker(checked) => write!(
                w,
                r#"<input disabled="" type="checkbox" {}/>"#,
                match checked {
                    true => r#"checked="" "#,
                    false => "",
                }
            ),
            Event::Text(text) => escape_html(&mut *w, &text),
        }
    }

    // Inside an image only text survives, escaped into the `alt` attribute.
    fn render_alt_text<W: StrWrite>(&mut self, w: &mut W, event: Event<'a>) -> io::Result<()> {
        match event {
            Event::Start(Tag::Image(..)) => {
                self.image_depth += 1;
                Ok(())
            }
            Event::End(Tag::Image(_, _, title)) => {
                self.image_depth -= 1;
                if self.image_depth > 0 {
                    return Ok(());
                }
                w.write_str("\"")?;
                if !title.is_empty() {
                    w.write_str(r#" title=""#)?;
                    escape_html(&mut *w, &title)?;
                    w.write_str("\"")?;
                }
                w.write_str(r#" loading="lazy" />"#)
            }
            Event::Text(text) | Event::Code(text) => escape_html(&mut *w, &text),
            Event::SoftBreak | Event::HardBreak => w.write_str(" "),
            _ => Ok(()),
        }
    }

    fn close_heading<W: StrWrite>(&mut self, w: &mut W, heading: OpenHeading) -> io::Result<()> {
        let id = self.unique_id(heading_id(&heading.text));
        write!(w, r#"<h{} id=""#, heading.level)?;
        escape_html(&mut *w, &id)?;
        w.write_str(r#"">"#)?;
        w.write_str(&heading.html)?;
        write!(w, "</h{}>", heading.level)?;
        self.headings.push(Heading {
            level: heading.level,
            text: heading.text.trim().to_owned(),
            id,
        });
        Ok(())
    }

    // Repeated headings get `-1`, `-2`, ... so anchors stay unique.
    // A suffixed id may itself collide with a literal heading (`Intro 1`),
    // so keep counting until the candidate is free.
    fn unique_id(&mut self, id: String) -> String {
        let mut candidate = id.clone();
        let mut n = 0;
        while self.seen_ids.contains(&candidate) {
            n += 1;
            candidate = format!("{}-{}", id, n);
        }
        self.seen_ids.insert(candidate.clone());
        candidate
    }

    fn on_start<W: StrWrite>(&mut self, w: &mut W, tag: Tag<'a>) -> io::Result<()> {
        match tag {
            Tag::BlockQuote => w.write_str("<blockquote>"),
            Tag::CodeBlock(kind) => {
                let lang = match &kind {
                    CodeBlockKind::Fenced(info) => info.split(' ').next().unwrap_or("").to_owned(),
                    CodeBlockKind::Indented => String::new(),
                };
                w.write_str(r#"<div class="code-block"><div class="code-block-header">"#)?;
                escape_html(&mut *w, if lang.is_empty() { "text" } else { &lang })?;
                w.write_str("</div>")?;
                match lang.is_empty() {
                    true => w.write_str("<pre><code>"),
                    false => {
                        w.write_str(r#"<pre><code class="language-"#)?;
                        escape_html(&mut *w, &lang)?;
                        w.write_str(r#"">"#)
                    }
                }
            }
            Tag::Emphasis => w.write_str("<em>"),
            Tag::FootnoteDefinition(name) => {
                w.write_str(r#"<div class="footnote-definition" id=""#)?;
                escape_html(&mut *w, &name)?;
                w.write_str(r#""><sup class="footnote-definition-label">"#)?;
                escape_html(&mut *w, &name)?;
                w.write_str("</sup>")
            }
            Tag::Heading(level) => {
                self.heading = Some(OpenHeading {
                    level,
                    html: String::new(),
                    text: String::new(),
                });
                Ok(())
            }
            Tag::Image(_link_type, dest, _title) => {
                self.image_depth += 1;
                w.write_str(r#"<img src=""#)?;
                escape_href(&mut *w, &dest)?;
                w.write_str(r#"" alt=""#)
            }
            Tag::Item => w.write_str("<li>"),
            Tag::Link(LinkType::Email, dest, title) => {
                w.write_str(r#"<a href="mailto:"#)?;
                escape_href(&mut *w, &dest)?;
                self.write_title(w, &title)?;
                w.write_str(">")
            }
            Tag::Link(_link_type, dest, title) => {
                let dest = self.convert_link(&dest);
                w.write_str(r#"<a href=""#)?;
                escape_href(&mut *w, &dest)?;
                w.write_str("\"")?;
                self.write_title(w, &title)?;
                if is_external(&dest) {
                    w.write_str(r#" class="external" target="_blank" rel="noopener noreferrer""#)?;
                }
                w.write_str(">")
            }
            Tag::List(None) => w.write_str("<ul>"),
            Tag::List(Some(1)) => w.write_str("<ol>"),
            Tag::List(Some(start)) => write!(w, r#"<ol start="{}">"#, start),
            Tag::Paragraph => w.write_str("<p>"),
            Tag::Strikethrough => w.write_str("<del>"),
            Tag::Strong => w.write_str("<strong>"),
            Tag::Table(alignments) => {
                self.table_alignments = alignments;
                w.write_str(r#"<div class="table-wrapper"><table>"#)
            }
            Tag::TableHead => {
                self.table_state = TableState::Head;
                self.table_cell_index = 0;
                w.write_str("<thead><tr>")
            }
            Tag::TableRow => {
                self.table_cell_index = 0;
                w.write_str("<tr>")
            }
            Tag::TableCell => write!(
                w,
                "<{}{}>",
                match self.table_state {
                    TableState::Head => "th",
                    TableState::Body => "td",
                },
                match self.table_alignments.get(self.table_cell_index) {
                    Some(Alignment::Left) => r#" align="left""#,
                    Some(Alignment::Right) => r#" align="right""#,
                    Some(Alignment::Center) => r#" align="center""#,
                    _ => "",
                }
            ),
        }
    }

    fn on_end<W: StrWrite>(&mut self, w: &mut W, tag: Tag) -> io::Result<()> {
        match tag {
            Tag::BlockQuote => w.write_str("</blockquote>"),
            Tag::CodeBlock(_) => w.write_str("</code></pre></div>"),
            Tag::Emphasis => w.write_str("</em>"),
            Tag::FootnoteDefinition(_) => w.write_str("</div>"),
            // headings are closed in `on_event`
            Tag::Heading(level) => write!(w, "</h{}>", level),
            // images are closed in `render_alt_text`
            Tag::Image(_, _, _) => Ok(()),
            Tag::Item => w.write_str("</li>"),
            Tag::Link(_, _, _) => w.write_str("</a>"),
            Tag::List(Some(_)) => w.write_str("</ol>"),
            Tag::List(None) => w.write_str("</ul>"),
            Tag::Paragraph => w.write_str("</p>"),
            Tag::Strikethrough => w.write_str("</del>"),
            Tag::Strong => w.write_str("</strong>"),
            Tag::Table(_) => w.write_str("</tbody></table></div>"),
            Tag::TableHead => {
                self.table_state = TableState::Body;
                w.write_str("</tr></thead><tbody>")
            }
            Tag::TableRow => w.write_str("</tr>"),
            Tag::TableCell => {
                self.table_cell_index += 1;
                w.write_str(match self.table_state {
                    TableState::Head => "</th>",
                    TableState::Body => "</td>",
                })
            }
        }
    }

    fn write_title<W: StrWrite>(&self, w: &mut W, title: &CowStr) -> io::Result<()> {
        if title.is_empty() {
            return Ok(());
        }
        w.write_str(r#" title=""#)?;
        escape_html(&mut *w, title)?;
        w.write_str("\"")
    }

    // Link conversion failures leave the destination as the author wrote it.
    fn convert_link(&self, dest: &str) -> String {
        self.link_converter
            .convert(dest)
            .unwrap_or_else(|_| dest.to_owned())
    }
}

fn is_external(dest: &str) -> bool {
    dest.starts_with("http://") || dest.starts_with("https://")
}

/// Converts [`Event`]s into an HTML string much like
/// `pulldown_cmark::html::push_html`, returning the headings encountered for
/// the table of contents. See the module description for the differences.
pub fn push_html<'a, I>(
    out: &mut String,
    events: I,
    link_converter: &LinkConverter,
) -> io::Result<Vec<Heading>>
where
    I: Iterator<Item = Event<'a>>,
{
    let mut renderer = HtmlRenderer::new(link_converter);
    for event in events {
        renderer.on_event(out, event)?;
    }
    Ok(renderer.headings)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_heading_id() {
        assert_eq!("hello-world", heading_id("Hello, World!"));
        assert_eq!("what-is-rust-2024", heading_id("  What is Rust 2024?  "));
        assert_eq!("asyncawait", heading_id("async/await"));
        assert_eq!("step-1---setup", heading_id("Step 1 - Setup"));
        assert_eq!("前端开发", heading_id("前端开发"));
    }
}
