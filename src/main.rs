use std::sync::Arc;

use anyhow::Context;

use pdf::{
    font::{
        cff::{CffFont, GlyphRef},
        Glyph,
    },
    geometry::PathOp,
};

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let mut args = std::env::args().skip(1);

    let path = args
        .next()
        .context("usage: cff_dump <font.cff> [glyph-name ...]")?;
    let names = args.collect::<Vec<String>>();

    let file = std::fs::read(&path).with_context(|| format!("failed to read {}", path))?;
    let font = CffFont::parse(&file).with_context(|| format!("failed to parse {}", path))?;

    println!("font: {}", font.name().unwrap_or("<unnamed>"));
    println!("glyphs: {}", font.glyph_count());
    println!("font matrix: {:?}", font.font_matrix());

    if names.is_empty() {
        for idx in 0..font.glyph_count() as u16 {
            dump_glyph(&font, GlyphRef::Index(idx));
        }
    } else {
        for name in &names {
            dump_glyph(&font, GlyphRef::Name(name));
        }
    }

    Ok(())
}

fn dump_glyph(font: &CffFont, glyph: GlyphRef) {
    let (decoded, error) = font.decode_glyph_lossy(glyph);

    if let Some(error) = error {
        println!("\n{:?}: error: {}", glyph, error);
        if decoded.outline.is_empty() {
            return;
        }
    }

    print_glyph(&decoded);
}

fn print_glyph(glyph: &Arc<Glyph>) {
    let bbox = glyph.bounding_box();

    println!("\n{}", glyph.name);
    println!("  advance width: {}", glyph.advance_width);
    if !bbox.is_empty() {
        println!(
            "  bbox: [{} {} {} {}]",
            bbox.min().x,
            bbox.min().y,
            bbox.max().x,
            bbox.max().y
        );
        println!("  size: {} x {}", bbox.width(), bbox.height());
    }

    for op in &glyph.outline.ops {
        match op {
            PathOp::MoveTo(p) => println!("  {} {} moveto", p.x, p.y),
            PathOp::LineTo(p) => println!("  {} {} lineto", p.x, p.y),
            PathOp::CurveTo {
                first_control_point: c1,
                second_control_point: c2,
                end,
            } => println!(
                "  {} {} {} {} {} {} curveto",
                c1.x, c1.y, c2.x, c2.y, end.x, end.y
            ),
            PathOp::Close => println!("  closepath"),
        }
    }
}
