use crate::model::ResultSet;
use crate::probe::{probe_url, ProbeTarget};
use crate::Result;
use std::fmt::Write as FmtWrite;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tracing::info;

// region:        --- Assets

const REPORT_CSS: &str = r#"
body { margin: 0; font-family: sans-serif; display: flex; height: 100vh; }
#list { width: 28em; overflow-y: auto; border-right: 1px solid #ccc; padding: 0.5em; }
#list li { list-style: none; margin: 0.2em 0; }
#list a.subdomain { cursor: pointer; color: #1a0dab; }
#list a.subdomain.active { font-weight: bold; color: #000; }
#list a.goog { margin-left: 0.5em; font-size: 0.8em; color: #888; cursor: pointer; }
#view { flex: 1; display: flex; flex-direction: column; }
#current-host { padding: 0.5em; border-bottom: 1px solid #ccc; }
#iframe { flex: 1; border: none; }
"#;

const REPORT_JS: &str = r#"
(function () {
  const links = Array.from(document.querySelectorAll('a.subdomain'));
  const showLink = a => {
    if (!a) { return; }
    links.forEach(l => l.classList.remove('active'));
    a.classList.add('active');
    const href = a.getAttribute('data-href');
    document.getElementById('iframe').setAttribute('src', href);
    document.getElementById('current-host').textContent = href;
  };
  links.forEach(a => a.addEventListener('click', () => showLink(a)));
  document.querySelectorAll('a.goog').forEach(a => a.addEventListener('click', () => {
    const q = 'site:' + a.getAttribute('data-host');
    window.open('https://google.com/search?q=' + encodeURIComponent(q));
  }));
  document.body.addEventListener('keydown', e => {
    const index = Math.max(0, links.findIndex(l => l.classList.contains('active')));
    if (e.keyCode == 37 && index > 0) {
      showLink(links[index - 1]);
    } else if (e.keyCode == 39 && index + 1 < links.length) {
      showLink(links[index + 1]);
    }
  });
  showLink(links[0]);
})();
"#;

// endregion:     --- Assets

/// Renders a standalone page listing every live candidate next to a preview frame.
pub fn render_html(result: &ResultSet, target: ProbeTarget) -> Result<String> {
    let generated_at = OffsetDateTime::now_utc().format(&Rfc3339)?;
    let host = escape_html(&result.host);

    let mut html = String::new();
    writeln!(&mut html, "<!DOCTYPE html>")?;
    writeln!(&mut html, "<html lang=\"en\">")?;
    writeln!(&mut html, "<head>")?;
    writeln!(&mut html, "<meta charset=\"UTF-8\">")?;
    writeln!(&mut html, "<title>{}</title>", host)?;
    writeln!(&mut html, "<style>{}</style>", REPORT_CSS)?;
    writeln!(&mut html, "</head>")?;
    writeln!(&mut html, "<body>")?;
    writeln!(&mut html, "<div id=\"list\">")?;
    writeln!(&mut html, "<h3>{} ({} live)</h3>", host, result.len())?;
    writeln!(&mut html, "<small>generated {}</small>", generated_at)?;
    writeln!(&mut html, "<ol>")?;

    for candidate in &result.candidates {
        let url = escape_html(&probe_url(target, candidate));
        let name = escape_html(candidate.as_str());
        writeln!(
            &mut html,
            "<li><a class=\"subdomain\" data-href=\"{}\">{}</a><a class=\"goog\" data-host=\"{}\">google</a></li>",
            url, name, name
        )?;
    }

    writeln!(&mut html, "</ol>")?;
    writeln!(&mut html, "</div>")?;
    writeln!(&mut html, "<div id=\"view\">")?;
    writeln!(&mut html, "<div id=\"current-host\"></div>")?;
    writeln!(&mut html, "<iframe id=\"iframe\"></iframe>")?;
    writeln!(&mut html, "</div>")?;
    writeln!(&mut html, "<script>{}</script>", REPORT_JS)?;
    writeln!(&mut html, "</body>")?;
    writeln!(&mut html, "</html>")?;

    Ok(html)
}

/// Writes the report and returns its absolute path.
pub fn export_to_html(result: &ResultSet, target: ProbeTarget, path: &Path) -> Result<PathBuf> {
    let html = render_html(result, target)?;
    let mut file = File::create(path)?;
    file.write_all(html.as_bytes())?;

    let abs = std::fs::canonicalize(path)?;
    info!("wrote to file://{}", abs.display());
    Ok(abs)
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}
