//! SVG export of the displayed tree
//!
//! Links are emitted with the same path geometry the canvas uses; cards become
//! rounded rects with the details lens and a status bar along the bottom.

use crate::tree::{build_path, LayoutConfig, Point, TreeLayout};
use crate::ui::card::render_card;
use std::fmt::Write;
use std::path::PathBuf;

const PAD: f64 = 40.0;
const STATUS_BAR_H: f64 = 10.0;
const LINE_H: f64 = 20.0;

/// Options that shape the exported document
#[derive(Debug, Clone, Copy)]
pub struct SvgOptions {
    pub straight: bool,
    pub show_lens: bool,
    pub light: bool,
}

struct Palette {
    bg: &'static str,
    card: &'static str,
    border: &'static str,
    fg: &'static str,
    dim: &'static str,
    link: &'static str,
}

const DARK: Palette = Palette {
    bg: "#121212",
    card: "#1e1e1e",
    border: "#424242",
    fg: "#eceff1",
    dim: "#90a4ae",
    link: "#757575",
};

const LIGHT: Palette = Palette {
    bg: "#fafafa",
    card: "#ffffff",
    border: "#cccccc",
    fg: "#212121",
    dim: "#616161",
    link: "#9e9e9e",
};

/// Render the whole tree as a standalone SVG document
pub fn generate_tree_svg(title: &str, layout: &TreeLayout, config: &LayoutConfig, opts: SvgOptions) -> String {
    let palette = if opts.light { &LIGHT } else { &DARK };
    let (nw, nh) = (config.node_width, config.node_height);

    let bounds = layout.bounds();
    let offset_x = PAD + nw / 2.0 - bounds.min_x;
    let offset_y = PAD + nh / 2.0 - bounds.min_y;
    let svg_w = bounds.width() + nw + 2.0 * PAD;
    let svg_h = bounds.height() + nh + 2.0 * PAD;
    let shift = |p: Point| Point::new(p.x + offset_x, p.y + offset_y);

    let mut svg = String::with_capacity(4096 + layout.nodes.len() * 512);
    let _ = write!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{svg_w}" height="{svg_h}" viewBox="0 0 {svg_w} {svg_h}">
<title>{title}</title>
<style>text {{ font-family: 'JetBrains Mono', 'Fira Code', Consolas, monospace; }}</style>
<rect width="{svg_w}" height="{svg_h}" fill="{bg}"/>
"#,
        title = esc(title),
        bg = palette.bg,
    );

    for link in &layout.links {
        let (source, target) = layout.link_endpoints(link);
        let path = build_path(
            Point::new(source.x, source.y),
            Point::new(target.x, target.y),
            opts.straight,
        )
        .map(shift);
        let _ = writeln!(
            svg,
            r#"<path d="{}" fill="none" stroke="{}" stroke-width="2"/>"#,
            path.to_svg(),
            palette.link
        );
    }

    for node in &layout.nodes {
        let card = render_card(node, opts.show_lens);
        let c = shift(Point::new(node.x, node.y));
        let (x, y) = (c.x - nw / 2.0, c.y - nh / 2.0);

        let _ = writeln!(
            svg,
            r#"<g><rect x="{x}" y="{y}" width="{nw}" height="{nh}" rx="5" fill="{}" stroke="{}"/>"#,
            palette.card, palette.border
        );
        let _ = writeln!(
            svg,
            r#"<text x="{}" y="{}" font-size="14" font-weight="bold" fill="{}" text-anchor="middle">{}</text>"#,
            c.x,
            y + 24.0,
            palette.fg,
            esc(&card.title)
        );
        for (i, detail) in card.details.iter().enumerate() {
            let _ = writeln!(
                svg,
                r#"<text x="{}" y="{}" font-size="12" fill="{}">{}</text>"#,
                x + 10.0,
                y + 24.0 + LINE_H * (i as f64 + 1.0),
                palette.dim,
                esc(&detail.text())
            );
        }
        let _ = writeln!(
            svg,
            r#"<rect x="{}" y="{}" width="{}" height="{STATUS_BAR_H}" rx="5" fill="{}"><title>{}</title></rect></g>"#,
            x + 10.0,
            y + nh - STATUS_BAR_H - 10.0,
            nw - 20.0,
            card.status.hex(),
            card.status.label()
        );
    }

    svg.push_str("</svg>\n");
    svg
}

/// Write the SVG to `~/capiview-export/<title>.svg`
pub fn save_tree_svg(
    title: &str,
    layout: &TreeLayout,
    config: &LayoutConfig,
    opts: SvgOptions,
) -> std::io::Result<PathBuf> {
    let svg = generate_tree_svg(title, layout, config, opts);
    let dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join("capiview-export");
    std::fs::create_dir_all(&dir)?;
    let path = dir.join(format!("{}.svg", file_stem(title)));
    std::fs::write(&path, svg)?;
    Ok(path)
}

fn file_stem(title: &str) -> String {
    let stem: String = title
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '-' })
        .collect();
    if stem.is_empty() {
        "tree".to_string()
    } else {
        stem.to_lowercase()
    }
}

fn esc(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{layout, normalize, TreeNode};

    fn sample() -> TreeLayout {
        let root: TreeNode = serde_json::from_str(
            r#"{"name": "mgmt<1>", "ready": true, "namespace": "capi", "children": [
                {"name": "w1", "phase": "Failed"},
                {"name": "w2", "phase": "Provisioning"}
            ]}"#,
        )
        .unwrap();
        layout(&normalize(&root), &LayoutConfig::default())
    }

    fn opts(straight: bool) -> SvgOptions {
        SvgOptions {
            straight,
            show_lens: true,
            light: false,
        }
    }

    #[test]
    fn test_svg_contains_every_node_and_link() {
        let tree = sample();
        let svg = generate_tree_svg("Management Cluster", &tree, &LayoutConfig::default(), opts(true));
        assert!(svg.starts_with("<svg"));
        assert!(svg.trim_end().ends_with("</svg>"));
        assert_eq!(svg.matches("<path ").count(), 2);
        assert_eq!(svg.matches("<g>").count(), 3);
        assert!(svg.contains("#f44336"));
        assert!(svg.contains("#2196f3"));
        assert!(svg.contains("Namespace: capi"));
    }

    #[test]
    fn test_link_style_follows_option() {
        let tree = sample();
        let straight = generate_tree_svg("t", &tree, &LayoutConfig::default(), opts(true));
        let curved = generate_tree_svg("t", &tree, &LayoutConfig::default(), opts(false));
        assert!(straight.contains(r#"d="M"#) && straight.contains(" L"));
        assert!(curved.contains(" C"));
    }

    #[test]
    fn test_text_is_escaped() {
        let svg = generate_tree_svg("a&b", &sample(), &LayoutConfig::default(), opts(true));
        assert!(svg.contains("mgmt&lt;1&gt;"));
        assert!(svg.contains("<title>a&amp;b</title>"));
    }

    #[test]
    fn test_file_stem() {
        assert_eq!(file_stem("Management Cluster"), "management-cluster");
        assert_eq!(file_stem("my_cluster-1"), "my_cluster-1");
        assert_eq!(file_stem(""), "tree");
    }
}
