use std::time::{Duration, Instant};

use verse_render::{
    Ari, HighlightInfo, Settings, SourceLinkFactory, VerseRenderer, display::verse_lines,
    markup::plain_text,
};

/// Performance benchmark suite for verse formatting
///
/// Run with: cargo test --release --bench performance -- --nocapture
///
/// This measures:
/// - Plain verse rendering
/// - Formatted verse rendering with tags and paragraphs
/// - Highlight overlay
/// - Terminal layout of rendered verses
const SMALL_CHAPTER_VERSES: usize = 30;
const LARGE_CHAPTER_VERSES: usize = 176;
const BOOK_VERSES: usize = 2000;

const ITERATIONS: usize = 100;

const SAMPLE_WORDS: [&str; 16] = [
    "In", "the", "beginning", "was", "the", "Word", "and", "the", "Word", "was", "with", "God",
    "light", "shineth", "in", "darkness",
];

fn sentence(idx: usize, words: usize) -> String {
    let mut text = String::new();
    for j in 0..words {
        if j > 0 {
            text.push(' ');
        }
        text.push_str(SAMPLE_WORDS[(idx + j) % SAMPLE_WORDS.len()]);
    }
    text
}

/// Unformatted verses of roughly 25 words
fn create_plain_chapter(num_verses: usize) -> Vec<String> {
    (0..num_verses).map(|idx| sentence(idx, 25)).collect()
}

/// Verses exercising every marker kind
fn create_formatted_chapter(num_verses: usize) -> Vec<String> {
    (0..num_verses)
        .map(|idx| {
            let opening = match idx % 4 {
                0 => "@^",
                1 => "@1",
                2 => "@0",
                _ => "",
            };
            format!(
                "@@{}{} @6{}@5@<f{}@>@/ {}@8@9{}@7@<x{}@>@/",
                opening,
                sentence(idx, 8),
                sentence(idx + 1, 5),
                idx % 255 + 1,
                sentence(idx + 2, 6),
                sentence(idx + 3, 4),
                idx % 200 + 1,
            )
        })
        .collect()
}

struct BenchmarkResult {
    name: String,
    iterations: usize,
    total_duration: Duration,
    avg_duration: Duration,
    min_duration: Duration,
    max_duration: Duration,
}

impl BenchmarkResult {
    fn print(&self) {
        println!("\n{}", "=".repeat(70));
        println!("Benchmark: {}", self.name);
        println!("{}", "=".repeat(70));
        println!("Iterations:     {}", self.iterations);
        println!("Total time:     {:?}", self.total_duration);
        println!("Average:        {:?}", self.avg_duration);
        println!("Min:            {:?}", self.min_duration);
        println!("Max:            {:?}", self.max_duration);
        println!(
            "Ops/sec:        {:.2}",
            1_000_000.0 / self.avg_duration.as_micros().max(1) as f64
        );

        if self.avg_duration.as_millis() > 100 {
            println!("\n⚠️  WARNING: Average duration > 100ms (user-perceptible lag)");
        } else if self.avg_duration.as_millis() > 16 {
            println!("\n⚠️  WARNING: Average duration > 16ms (may drop frames)");
        }
    }
}

fn benchmark<F>(name: &str, iterations: usize, mut f: F) -> BenchmarkResult
where
    F: FnMut(),
{
    let mut durations = Vec::with_capacity(iterations);

    // Warmup
    for _ in 0..10 {
        f();
    }

    for _ in 0..iterations {
        let start = Instant::now();
        f();
        durations.push(start.elapsed());
    }

    let total_duration: Duration = durations.iter().sum();
    let avg_duration = total_duration / iterations as u32;
    let min_duration = *durations.iter().min().unwrap();
    let max_duration = *durations.iter().max().unwrap();

    BenchmarkResult {
        name: name.to_string(),
        iterations,
        total_duration,
        avg_duration,
        min_duration,
        max_duration,
    }
}

fn render_all(renderer: VerseRenderer<'_>, verses: &[String]) -> usize {
    let mut total = 0;
    for (idx, text) in verses.iter().enumerate() {
        let ari = Ari::encode(43, 1, (idx % 255 + 1) as u8);
        let label = ari.verse_label();
        let verse = renderer.render(ari, text, &label).unwrap();
        total += verse.buffer().len();
    }
    total
}

#[test]
fn bench_plain_rendering() {
    println!("\n\n╔════════════════════════════════════════════════════════════════╗");
    println!("║           PLAIN VERSE RENDERING BENCHMARKS                     ║");
    println!("╚════════════════════════════════════════════════════════════════╝");

    let settings = Settings::default();
    let renderer = VerseRenderer::new(&settings);
    let chapters = vec![
        ("Small chapter (30 verses)", create_plain_chapter(SMALL_CHAPTER_VERSES)),
        ("Large chapter (176 verses)", create_plain_chapter(LARGE_CHAPTER_VERSES)),
        ("Book (2000 verses)", create_plain_chapter(BOOK_VERSES)),
    ];

    for (name, verses) in chapters {
        let result = benchmark(&format!("render plain - {}", name), ITERATIONS, || {
            let _ = render_all(renderer, &verses);
        });
        result.print();
    }
}

#[test]
fn bench_formatted_rendering() {
    println!("\n\n╔════════════════════════════════════════════════════════════════╗");
    println!("║         FORMATTED VERSE RENDERING BENCHMARKS                   ║");
    println!("╚════════════════════════════════════════════════════════════════╝");

    let settings = Settings::default();
    let links = SourceLinkFactory::new(0);
    let renderer = VerseRenderer::new(&settings).with_links(Some(&links));
    let chapters = vec![
        ("Small chapter (30 verses)", create_formatted_chapter(SMALL_CHAPTER_VERSES)),
        ("Large chapter (176 verses)", create_formatted_chapter(LARGE_CHAPTER_VERSES)),
        ("Book (2000 verses)", create_formatted_chapter(BOOK_VERSES)),
    ];

    for (name, verses) in chapters {
        let result = benchmark(&format!("render formatted - {}", name), ITERATIONS, || {
            let _ = render_all(renderer, &verses);
        });
        result.print();
    }
}

#[test]
fn bench_highlighted_rendering() {
    println!("\n\n╔════════════════════════════════════════════════════════════════╗");
    println!("║           HIGHLIGHT OVERLAY BENCHMARKS                         ║");
    println!("╚════════════════════════════════════════════════════════════════╝");

    let settings = Settings::default();
    let verses = create_formatted_chapter(LARGE_CHAPTER_VERSES);
    let whole = HighlightInfo::whole(0xffff00);

    let result_whole = benchmark("render - whole verse highlight", ITERATIONS, || {
        let renderer = VerseRenderer::new(&settings).with_highlight(Some(&whole));
        let _ = render_all(renderer, &verses);
    });
    result_whole.print();

    // Partial highlights hash the rendered body on every verse.
    let partials: Vec<HighlightInfo> = verses
        .iter()
        .map(|text| HighlightInfo::partial(0x00ff00, 2, 12, &plain_text(text)))
        .collect();
    let result_partial = benchmark("render - partial highlight", ITERATIONS, || {
        for (idx, (text, highlight)) in verses.iter().zip(&partials).enumerate() {
            let ari = Ari::encode(43, 1, (idx % 255 + 1) as u8);
            let label = ari.verse_label();
            let _ = VerseRenderer::new(&settings)
                .with_highlight(Some(highlight))
                .render(ari, text, &label)
                .unwrap();
        }
    });
    result_partial.print();
}

#[test]
fn bench_terminal_layout() {
    println!("\n\n╔════════════════════════════════════════════════════════════════╗");
    println!("║           TERMINAL LAYOUT BENCHMARKS                           ║");
    println!("╚════════════════════════════════════════════════════════════════╝");

    let settings = Settings::default();
    let links = SourceLinkFactory::new(0);
    let renderer = VerseRenderer::new(&settings).with_links(Some(&links));
    let verses = create_formatted_chapter(LARGE_CHAPTER_VERSES);
    let buffers: Vec<_> = verses
        .iter()
        .enumerate()
        .map(|(idx, text)| {
            let ari = Ari::encode(43, 1, (idx % 255 + 1) as u8);
            let label = ari.verse_label();
            renderer.render(ari, text, &label).unwrap().into_buffer()
        })
        .collect();

    for width in [40, 80, 160] {
        let result = benchmark(&format!("verse_lines - width {}", width), ITERATIONS, || {
            let mut total = 0;
            for buffer in &buffers {
                total += verse_lines(buffer, width, &settings).len();
            }
            assert!(total >= buffers.len());
        });
        result.print();
    }
}
