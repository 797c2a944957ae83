//! HTML minification.
//!
//! A conservative streaming pass over rendered output: strips comments and
//! collapses whitespace runs to a single space, leaving the content of
//! whitespace-sensitive elements untouched.

use std::cell::RefCell;
use std::rc::Rc;

use lol_html::html_content::ContentType;
use lol_html::{HtmlRewriter, Settings, comments, element, text};

use crate::render::RenderError;

/// Elements whose text must pass through verbatim.
const LITERAL_ELEMENTS: [&str; 4] = ["pre", "script", "style", "textarea"];

pub(crate) fn minify_html(html: &str) -> Result<String, RenderError> {
    let mut out = Vec::with_capacity(html.len());

    // Depth of enclosing whitespace-sensitive elements; handlers fire in
    // document order, so the counter is accurate when each text chunk runs.
    let literal_depth = Rc::new(RefCell::new(0usize));

    let mut handlers = vec![comments!("*", |comment| {
        comment.remove();
        Ok(())
    })];

    for tag in LITERAL_ELEMENTS {
        let enter_depth = Rc::clone(&literal_depth);
        handlers.push(element!(tag, move |element| {
            *enter_depth.borrow_mut() += 1;
            let leave_depth = Rc::clone(&enter_depth);
            if let Some(end_handlers) = element.end_tag_handlers() {
                let end_handler: lol_html::EndTagHandler<'static> = Box::new(move |_end| {
                    *leave_depth.borrow_mut() -= 1;
                    Ok(())
                });
                end_handlers.push(end_handler);
            }
            Ok(())
        }));
    }

    let text_depth = Rc::clone(&literal_depth);
    handlers.push(text!("*", move |chunk| {
        if *text_depth.borrow() == 0 {
            let collapsed = collapse_whitespace(chunk.as_str());
            if collapsed != chunk.as_str() {
                // The chunk is already valid HTML text; re-insert it
                // unescaped to avoid double entity encoding.
                chunk.replace(&collapsed, ContentType::Html);
            }
        }
        Ok(())
    }));

    let mut rewriter = HtmlRewriter::new(
        Settings {
            element_content_handlers: handlers,
            ..Settings::new()
        },
        |bytes: &[u8]| out.extend_from_slice(bytes),
    );

    rewriter
        .write(html.as_bytes())
        .map_err(|error| RenderError::Minify(error.to_string()))?;
    // `end` consumes the rewriter, releasing its borrow of the output buffer.
    rewriter
        .end()
        .map_err(|error| RenderError::Minify(error.to_string()))?;

    String::from_utf8(out).map_err(|error| RenderError::Minify(error.to_string()))
}

fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_whitespace = false;
    for ch in text.chars() {
        if ch.is_whitespace() {
            if !in_whitespace {
                out.push(' ');
            }
            in_whitespace = true;
        } else {
            out.push(ch);
            in_whitespace = false;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comments_are_stripped() {
        let html = "<div><!-- internal note -->content</div>";
        let minified = minify_html(html).expect("minify");
        assert_eq!(minified, "<div>content</div>");
    }

    #[test]
    fn whitespace_runs_collapse_to_a_single_space() {
        let html = "<p>\n    spaced   out\n  </p>";
        let minified = minify_html(html).expect("minify");
        assert_eq!(minified, "<p> spaced out </p>");
    }

    #[test]
    fn literal_elements_keep_their_whitespace() {
        let html = "<pre>  a\n    b</pre><p>  c  </p>";
        let minified = minify_html(html).expect("minify");
        assert_eq!(minified, "<pre>  a\n    b</pre><p> c </p>");
    }

    #[test]
    fn collapse_is_a_noop_on_already_minified_input() {
        let html = "<ul><li>one</li><li>two</li></ul>";
        assert_eq!(minify_html(html).expect("minify"), html);
    }
}
