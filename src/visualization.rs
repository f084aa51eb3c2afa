//! Visualization utilities for route solutions.
//!
//! Generates SVG drawings of tours and convergence curves, plus plain-text
//! exports for external plotting tools.

use crate::error::{Result, SolverError};
use crate::heuristics::genetic::GenerationStats;
use crate::instance::RouteInstance;
use crate::solution::Solution;
use std::fs;
use std::io;
use std::path::Path;
use std::process::Command;

const STYLE: &str = r##"<style>
    .stop { fill: #3498db; stroke: #2c3e50; stroke-width: 2; }
    .anchor { fill: #e74c3c; stroke: #c0392b; stroke-width: 2; }
    .edge { stroke: #34495e; stroke-width: 2; fill: none; }
    .best { stroke: #27ae60; stroke-width: 2; fill: none; }
    .mean { stroke: #95a5a6; stroke-width: 1.5; fill: none; stroke-dasharray: 4,3; }
    .axis { stroke: #2c3e50; stroke-width: 1; }
    .label { font-family: Arial; font-size: 11px; fill: #2c3e50; }
    .title { font-family: Arial; font-size: 14px; fill: #2c3e50; font-weight: bold; }
</style>"##;

/// SVG visualization generator
pub struct Visualizer {
    /// Canvas width
    pub width: f64,
    /// Canvas height
    pub height: f64,
    pub margin: f64,
    pub node_radius: f64,
    /// Location drawn as the start of the route
    pub anchor: usize,
}

impl Default for Visualizer {
    fn default() -> Self {
        Visualizer {
            width: 800.0,
            height: 800.0,
            margin: 50.0,
            node_radius: 8.0,
            anchor: 0,
        }
    }
}

impl Visualizer {
    pub fn new() -> Self {
        Self::default()
    }

    fn header(&self, width: f64, height: f64) -> String {
        format!(
            r##"<?xml version="1.0" encoding="UTF-8"?>
<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">
{style}
<rect width="100%" height="100%" fill="#ecf0f1"/>
"##,
            w = width,
            h = height,
            style = STYLE
        )
    }

    /// Draw the tour as a closed polygon over the location map
    pub fn generate_svg(&self, instance: &RouteInstance, solution: &Solution) -> String {
        let mut svg = self.header(self.width, self.height);

        svg.push_str(&format!(
            "<text x=\"{}\" y=\"25\" class=\"title\">{} | {} stops | Cost: {:.3}</text>\n",
            self.margin,
            escape(&instance.name),
            solution.tour.len(),
            solution.cost
        ));

        let (min_x, max_x, min_y, max_y) = instance.statistics().bounds;
        let scale_x = (self.width - 2.0 * self.margin) / (max_x - min_x).max(1.0);
        let scale_y = (self.height - 2.0 * self.margin) / (max_y - min_y).max(1.0);
        let scale = scale_x.min(scale_y);

        let project = |x: f64, y: f64| -> (f64, f64) {
            (
                self.margin + (x - min_x) * scale,
                self.height - self.margin - (y - min_y) * scale,
            )
        };

        let locations = instance.locations();

        if solution.tour.len() > 1 {
            let points: Vec<String> = solution
                .tour
                .iter()
                .filter_map(|&i| locations.get(i))
                .map(|loc| {
                    let (x, y) = project(loc.x, loc.y);
                    format!("{:.2},{:.2}", x, y)
                })
                .collect();
            svg.push_str(&format!(
                "<polygon points=\"{}\" class=\"edge\"/>\n",
                points.join(" ")
            ));
        }

        for (i, loc) in locations.iter().enumerate() {
            let (x, y) = project(loc.x, loc.y);
            let class = if i == self.anchor { "anchor" } else { "stop" };
            let order = solution
                .position(i)
                .map(|p| format!("{}. ", p + 1))
                .unwrap_or_default();

            svg.push_str(&format!(
                "<circle cx=\"{:.2}\" cy=\"{:.2}\" r=\"{}\" class=\"{}\"/>\n",
                x, y, self.node_radius, class
            ));
            svg.push_str(&format!(
                "<text x=\"{:.2}\" y=\"{:.2}\" class=\"label\" text-anchor=\"middle\">{}{}</text>\n",
                x,
                y - self.node_radius - 4.0,
                order,
                escape(&loc.name)
            ));
        }

        svg.push_str("</svg>\n");
        svg
    }

    /// Plot best-ever and mean population cost per generation
    pub fn generate_convergence_svg(&self, history: &[GenerationStats]) -> String {
        let width = self.width;
        let height = 400.0;
        let margin = self.margin;
        let mut svg = self.header(width, height);

        svg.push_str(&format!(
            "<text x=\"{}\" y=\"25\" class=\"title\">Convergence ({} generations)</text>\n",
            margin,
            history.len().saturating_sub(1)
        ));
        svg.push_str(&format!(
            "<line x1=\"{m}\" y1=\"{b}\" x2=\"{r}\" y2=\"{b}\" class=\"axis\"/>\n<line x1=\"{m}\" y1=\"{m}\" x2=\"{m}\" y2=\"{b}\" class=\"axis\"/>\n",
            m = margin,
            b = height - margin,
            r = width - margin
        ));

        if history.is_empty() {
            svg.push_str("</svg>\n");
            return svg;
        }

        let finite = |c: f64| c.is_finite().then_some(c);
        let max_cost = history
            .iter()
            .filter_map(|s| finite(s.mean_cost))
            .fold(f64::NEG_INFINITY, f64::max);
        let min_cost = history
            .iter()
            .filter_map(|s| finite(s.best_ever_cost))
            .fold(f64::INFINITY, f64::min);
        let span = (max_cost - min_cost).max(1e-9);
        let last = history.last().map(|s| s.generation).unwrap_or(0).max(1) as f64;

        let plot_w = width - 2.0 * margin;
        let plot_h = height - 2.0 * margin;
        let project = |generation: usize, cost: f64| -> (f64, f64) {
            (
                margin + generation as f64 / last * plot_w,
                height - margin - (cost - min_cost) / span * plot_h,
            )
        };

        let polyline = |select: &dyn Fn(&GenerationStats) -> f64| -> String {
            history
                .iter()
                .filter(|s| select(s).is_finite())
                .map(|s| {
                    let (x, y) = project(s.generation, select(s));
                    format!("{:.2},{:.2}", x, y)
                })
                .collect::<Vec<_>>()
                .join(" ")
        };

        svg.push_str(&format!(
            "<polyline points=\"{}\" class=\"mean\"/>\n",
            polyline(&|s| s.mean_cost)
        ));
        svg.push_str(&format!(
            "<polyline points=\"{}\" class=\"best\"/>\n",
            polyline(&|s| s.best_ever_cost)
        ));

        svg.push_str(&format!(
            "<text x=\"{}\" y=\"{}\" class=\"label\">{:.3}</text>\n<text x=\"{}\" y=\"{}\" class=\"label\">{:.3}</text>\n",
            5.0,
            margin + 4.0,
            max_cost,
            5.0,
            height - margin,
            min_cost
        ));

        svg.push_str("</svg>\n");
        svg
    }

    /// Save SVG to file
    pub fn save_svg<P: AsRef<Path>>(&self, svg: &str, path: P) -> Result<()> {
        fs::write(path, svg)?;
        Ok(())
    }

    /// Save SVG as PNG through the first external converter that succeeds
    pub fn save_png<P: AsRef<Path>>(&self, svg: &str, path: P) -> Result<()> {
        render_png(svg, path.as_ref(), PNG_CONVERTERS)
    }

    /// Export data for external plotting (e.g., matplotlib)
    pub fn export_plot_data(&self, instance: &RouteInstance, solution: &Solution) -> String {
        let mut data = String::new();

        data.push_str(&format!("# Instance: {}\n", instance.name));
        data.push_str(&format!("# Cost: {:.6}\n\n", solution.cost));

        data.push_str("# Locations: index, name, x, y\n");
        for (i, loc) in instance.locations().iter().enumerate() {
            data.push_str(&format!("{},{},{},{}\n", i, loc.name, loc.x, loc.y));
        }

        data.push_str("\n# Tour: visiting order by index\n");
        let tour: Vec<String> = solution.tour.iter().map(|i| i.to_string()).collect();
        data.push_str(&tour.join(","));
        data.push('\n');

        data
    }
}

/// External programs tried in order by `save_png`
const PNG_CONVERTERS: &[&str] = &["rsvg-convert", "magick", "inkscape"];

fn converter_args<'a>(program: &str, src: &'a str, dst: &'a str) -> Vec<&'a str> {
    match program {
        "rsvg-convert" => vec!["-o", dst, src],
        "magick" => vec!["convert", src, dst],
        "inkscape" => vec![src, "--export-type=png", "--export-filename", dst],
        _ => vec![src, dst],
    }
}

fn render_png(svg: &str, path: &Path, converters: &[&str]) -> Result<()> {
    let tmp_svg = path.with_extension("svg.tmp");
    fs::write(&tmp_svg, svg)?;

    let src = tmp_svg.to_string_lossy().into_owned();
    let dst = path.to_string_lossy().into_owned();

    let mut converted = false;
    for program in converters {
        match Command::new(program).args(converter_args(program, &src, &dst)).status() {
            Ok(status) if status.success() => {
                log::debug!("Rendered {} with {}", dst, program);
                converted = true;
                break;
            }
            Ok(status) => log::debug!("{} exited with {}", program, status),
            Err(e) => log::debug!("{} unavailable: {}", program, e),
        }
    }

    let _ = fs::remove_file(&tmp_svg);
    if converted {
        Ok(())
    } else {
        Err(SolverError::Io(io::Error::new(
            io::ErrorKind::NotFound,
            format!("no SVG to PNG converter succeeded (tried {})", converters.join(", ")),
        )))
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn demo_solution(instance: &RouteInstance) -> Solution {
        Solution::from_tour(instance, vec![0, 3, 1, 2, 4], "test")
    }

    #[test]
    fn test_tour_svg() {
        let instance = RouteInstance::demo();
        let svg = Visualizer::new().generate_svg(&instance, &demo_solution(&instance));

        assert!(svg.starts_with("<?xml"));
        assert!(svg.trim_end().ends_with("</svg>"));
        assert_eq!(svg.matches("<circle").count(), 5);
        assert_eq!(svg.matches("class=\"anchor\"").count(), 1);
        assert!(svg.contains("<polygon"));
        assert!(svg.contains("1. Home"));
    }

    #[test]
    fn test_convergence_svg() {
        let history: Vec<GenerationStats> = (0..5)
            .map(|g| GenerationStats {
                generation: g,
                best_ever_cost: 20.0 - g as f64,
                population_best_cost: 20.0 - g as f64,
                mean_cost: 30.0 - g as f64,
            })
            .collect();
        let svg = Visualizer::new().generate_convergence_svg(&history);
        assert_eq!(svg.matches("<polyline").count(), 2);
        assert!(svg.contains("Convergence (4 generations)"));

        let empty = Visualizer::new().generate_convergence_svg(&[]);
        assert!(!empty.contains("<polyline"));
    }

    #[test]
    fn test_plot_data_and_save() {
        let instance = RouteInstance::demo();
        let solution = demo_solution(&instance);
        let viz = Visualizer::new();

        let data = viz.export_plot_data(&instance, &solution);
        assert!(data.contains("0,Home,0,0"));
        assert!(data.trim_end().ends_with("0,3,1,2,4"));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tour.svg");
        viz.save_svg(&viz.generate_svg(&instance, &solution), &path).unwrap();
        assert!(std::fs::read_to_string(&path).unwrap().contains("Market"));
    }

    #[test]
    fn test_png_without_converter() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tour.png");
        let svg = Visualizer::new().generate_convergence_svg(&[]);

        let err = render_png(&svg, &path, &["route-optimizer-no-such-converter"]).unwrap_err();
        match err {
            SolverError::Io(e) => assert_eq!(e.kind(), io::ErrorKind::NotFound),
            other => panic!("unexpected error: {}", other),
        }
        assert!(!path.exists());
        assert!(!path.with_extension("svg.tmp").exists());
    }

    #[test]
    fn test_converter_args() {
        assert_eq!(converter_args("rsvg-convert", "a.svg", "a.png"), vec!["-o", "a.png", "a.svg"]);
        assert_eq!(converter_args("magick", "a.svg", "a.png"), vec!["convert", "a.svg", "a.png"]);
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape("A&B <x>"), "A&amp;B &lt;x&gt;");
    }
}
