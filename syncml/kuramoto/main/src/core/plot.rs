//! Minimal SVG line chart for phase histories.

use std::f64::consts::TAU;
use std::io::Write;

use crate::api::error::KuramotoResult;
use crate::core::history::PhaseHistory;

const WIDTH: f64 = 1000.0;
const HEIGHT: f64 = 500.0;
const MARGIN_LEFT: f64 = 70.0;
const MARGIN_RIGHT: f64 = 170.0;
const MARGIN_TOP: f64 = 40.0;
const MARGIN_BOTTOM: f64 = 55.0;
/// Polylines are decimated to at most this many points.
const MAX_POINTS: usize = 2000;

const PALETTE: [&str; 10] = [
    "#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd",
    "#8c564b", "#e377c2", "#7f7f7f", "#bcbd22", "#17becf",
];

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

pub(crate) fn write_phase_chart<W: Write>(
    history: &PhaseHistory,
    mut w: W,
    title: &str,
) -> KuramotoResult<()> {
    let plot_w = WIDTH - MARGIN_LEFT - MARGIN_RIGHT;
    let plot_h = HEIGHT - MARGIN_TOP - MARGIN_BOTTOM;
    let x_max = history.len().saturating_sub(1).max(1) as f64;
    let px = |t: f64| MARGIN_LEFT + t / x_max * plot_w;
    let py = |theta: f64| MARGIN_TOP + (1.0 - theta / TAU) * plot_h;

    writeln!(
        w,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{}" height="{}" viewBox="0 0 {} {}" font-family="sans-serif">"#,
        WIDTH, HEIGHT, WIDTH, HEIGHT
    )?;
    writeln!(w, r#"<rect width="100%" height="100%" fill="white"/>"#)?;
    writeln!(
        w,
        r#"<text x="{:.1}" y="24" text-anchor="middle" font-size="16">{}</text>"#,
        MARGIN_LEFT + plot_w / 2.0,
        escape(title)
    )?;

    // Axes frame
    writeln!(
        w,
        r#"<rect x="{}" y="{}" width="{}" height="{}" fill="none" stroke="black"/>"#,
        MARGIN_LEFT, MARGIN_TOP, plot_w, plot_h
    )?;

    // Y ticks at multiples of pi/2
    for k in 0..=4 {
        let theta = k as f64 * TAU / 4.0;
        let y = py(theta);
        writeln!(
            w,
            r#"<line x1="{:.1}" y1="{:.1}" x2="{:.1}" y2="{:.1}" stroke="black"/><text x="{:.1}" y="{:.1}" text-anchor="end" font-size="11">{:.2}</text>"#,
            MARGIN_LEFT - 5.0, y, MARGIN_LEFT, y, MARGIN_LEFT - 8.0, y + 4.0, theta
        )?;
    }

    // X ticks at fifths of the range
    for k in 0..=5 {
        let t = x_max * k as f64 / 5.0;
        let x = px(t);
        let bottom = MARGIN_TOP + plot_h;
        writeln!(
            w,
            r#"<line x1="{:.1}" y1="{:.1}" x2="{:.1}" y2="{:.1}" stroke="black"/><text x="{:.1}" y="{:.1}" text-anchor="middle" font-size="11">{}</text>"#,
            x, bottom, x, bottom + 5.0, x, bottom + 18.0, t.round()
        )?;
    }

    writeln!(
        w,
        r#"<text x="{:.1}" y="{:.1}" text-anchor="middle" font-size="13">Time Step</text>"#,
        MARGIN_LEFT + plot_w / 2.0,
        HEIGHT - 12.0
    )?;
    writeln!(
        w,
        r#"<text x="18" y="{:.1}" text-anchor="middle" font-size="13" transform="rotate(-90 18 {:.1})">Phase (radians)</text>"#,
        MARGIN_TOP + plot_h / 2.0,
        MARGIN_TOP + plot_h / 2.0
    )?;

    let stride = history.len().div_ceil(MAX_POINTS).max(1);
    for i in 0..history.num_oscillators() {
        let color = PALETTE[i % PALETTE.len()];
        write!(w, r#"<polyline fill="none" stroke="{}" stroke-width="1" points=""#, color)?;
        for (t, theta) in history.series(i).enumerate().step_by(stride) {
            write!(w, "{:.2},{:.2} ", px(t as f64), py(theta))?;
        }
        writeln!(w, r#""/>"#)?;

        let ly = MARGIN_TOP + 15.0 + i as f64 * 18.0;
        let lx = MARGIN_LEFT + plot_w + 15.0;
        writeln!(
            w,
            r#"<line x1="{:.1}" y1="{:.1}" x2="{:.1}" y2="{:.1}" stroke="{}" stroke-width="2"/><text x="{:.1}" y="{:.1}" font-size="12">Oscillator {}</text>"#,
            lx, ly, lx + 20.0, ly, color, lx + 26.0, ly + 4.0, i + 1
        )?;
    }

    writeln!(w, "</svg>")?;
    w.flush()?;
    Ok(())
}
