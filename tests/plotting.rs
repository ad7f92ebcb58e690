use std::fs;
use std::io::Cursor;

use ndarray::{Array1, Array2, Axis};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use spectral_pca::plot::{
    line_plot, save_plot_with, Chart, LineOptions, LoadingsOptions, Marker, ScoresOptions, ScreeOptions,
    ScreeShow,
};
use spectral_pca::{Pca, SpectraError, SpectralTable};

fn fitted_pca() -> Pca {
    let mut rng = ChaCha8Rng::seed_from_u64(2024);
    let axis: Array1<f64> = Array1::linspace(500.0, 1500.0, 80);
    let data = Array2::from_shape_fn((8, 80), |(i, j)| {
        let band = (-(axis[j] - 1000.0).powi(2) / 800.0).exp();
        (i as f64 + 1.0) * band + rng.gen_range(-0.1..0.1)
    });
    let samples = (0..8).map(|i| format!("sample-{}", i)).collect();
    let table = SpectralTable::new(samples, axis, data).unwrap();
    Pca::new(&table, Some(4)).unwrap()
}

#[test]
fn test_scree_chart_renders_percent_labels() {
    let pca = fitted_pca();
    let chart = pca.scree_plot(&ScreeOptions::default()).unwrap();
    let first = format!("{:.2}%", pca.explained_variance_ratio()[0] * 100.0);
    assert_eq!(chart.annotations[0].text, first);

    let svg = chart.to_svg().unwrap();
    assert!(svg.contains(&first));
    assert!(svg.contains("Scree plot"));
}

#[test]
fn test_scree_show_accepts_string_forms() {
    let pca = fitted_pca();
    let show: ScreeShow = "exp_var".parse().unwrap();
    let chart = pca
        .scree_plot(&ScreeOptions { show, ..Default::default() })
        .unwrap();
    assert_eq!(chart.series.len(), 1);
    assert_eq!(chart.annotations.len(), 4);
    assert!(matches!("bogus".parse::<ScreeShow>(), Err(SpectraError::InvalidInput(_))));
}

#[test]
fn test_scores_chart_labels_every_sample() {
    let pca = fitted_pca();
    let chart = pca
        .scores_plot(&ScoresOptions { pc: (1, 3), ..Default::default() })
        .unwrap();
    assert!(chart.y_axis.label.starts_with("PC3 ("));
    let svg = chart.to_svg().unwrap();
    for i in 0..8 {
        assert!(svg.contains(&format!("sample-{}", i)));
    }
}

#[test]
fn test_loadings_charts_and_line_plot_render() {
    let pca = fitted_pca();
    let charts = pca
        .loadings_plot_all(&LoadingsOptions { legend: true, ..Default::default() })
        .unwrap();
    assert_eq!(charts.len(), 4);
    for chart in &charts {
        assert!(chart.to_svg().is_ok());
    }

    let mean = pca.mean().insert_axis(Axis(0));
    let chart = line_plot(
        pca.axis(),
        mean,
        &LineOptions {
            title: "Mean spectrum".into(),
            markers: vec![Marker::Circle],
            ..Default::default()
        },
    )
    .unwrap();
    assert!(chart.to_svg().unwrap().contains("Mean spectrum"));
}

#[test]
fn test_save_creates_directory_after_confirmation() {
    let pca = fitted_pca();
    let chart = pca.scree_plot(&ScreeOptions::default()).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("out").join("scree.svg");

    let mut prompt = Vec::new();
    let saved = save_plot_with(&chart, &target, Cursor::new("y\n"), &mut prompt).unwrap();
    assert_eq!(saved.as_deref(), Some(target.as_path()));
    assert!(fs::read_to_string(&target).unwrap().contains("<svg"));

    let prompt = String::from_utf8(prompt).unwrap();
    assert!(prompt.contains("does not exist. Do you want to create it?"));
    assert!(prompt.ends_with(&format!("Plot saved as: {}\n", target.display())));
}

#[test]
fn test_saved_json_restores_the_chart() {
    let pca = fitted_pca();
    let chart = pca.loadings_plot(&LoadingsOptions::default()).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("loadings.json");

    save_plot_with(&chart, &target, Cursor::new(""), Vec::new()).unwrap();
    let restored: Chart = serde_json::from_str(&fs::read_to_string(&target).unwrap()).unwrap();
    assert_eq!(restored.title, chart.title);
    assert_eq!(restored.series.len(), chart.series.len());
    assert_eq!(restored.series[0].points.len(), 80);
}
