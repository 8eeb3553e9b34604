use chrono::NaiveDate;
use optistock::label::{
    format_lot, format_thai_date, parse_paper_size, CustomLabelSettings, FontStyle, FontStyles, LabelGrid,
    LabelSettings, Orientation, PAPER_SIZES, PX_PER_MM,
};

#[test]
fn grid_always_holds_every_copy() {
    for copies in 1..=100 {
        for (w, h) in [(50.0, 30.0), (30.0, 50.0), (100.0, 20.0), (40.0, 40.0)] {
            let grid = LabelGrid::for_copies(copies, w, h);
            assert!(grid.cols >= 1 && grid.cols <= copies);
            assert!(grid.capacity() >= copies, "{} copies on {}x{}: {:?}", copies, w, h, grid);
            // no fully empty row
            assert!((grid.rows - 1) * grid.cols < copies);
        }
    }
}

#[test]
fn grid_follows_aspect_ratio() {
    assert_eq!(LabelGrid::for_copies(1, 50.0, 30.0), LabelGrid { rows: 1, cols: 1 });
    // wide label: sqrt(4 * 50/30) = 2.58 -> 3 columns, 2 rows
    assert_eq!(LabelGrid::for_copies(4, 50.0, 30.0), LabelGrid { rows: 2, cols: 3 });
    // tall label: sqrt(4 * 30/50) = 1.55 -> 2 columns
    assert_eq!(LabelGrid::for_copies(4, 30.0, 50.0), LabelGrid { rows: 2, cols: 2 });
    // zero copies is treated as one
    assert_eq!(LabelGrid::for_copies(0, 50.0, 30.0), LabelGrid { rows: 1, cols: 1 });
}

#[test]
fn barcode_settings_are_clamped() {
    let settings = LabelSettings {
        label_width: 500.0,
        label_height: 5.0,
        copies: 0,
        show_price: false,
        font_size: 40,
    }
    .clamped();
    assert_eq!(settings.label_width, 100.0);
    assert_eq!(settings.label_height, 20.0);
    assert_eq!(settings.copies, 1);
    assert_eq!(settings.font_size, 20);

    let nan = LabelSettings {
        label_width: f64::NAN,
        ..LabelSettings::default()
    }
    .clamped();
    assert_eq!(nan.label_width, 50.0);
}

#[test]
fn barcode_layout_shrinks_with_copies() {
    let single = LabelSettings::default().layout();
    assert_eq!(single.scale, 1.0);
    assert_eq!(single.barcode.format, "CODE128");
    assert_eq!(single.barcode.bar_width, 2);
    assert_eq!(single.barcode.margin, 5);

    let many = LabelSettings {
        copies: 12,
        ..LabelSettings::default()
    }
    .layout();
    assert!(many.scale < single.scale);
    assert!(many.grid.capacity() >= 12);
    assert!((many.cell_width * many.grid.cols as f64 - 50.0).abs() < 1e-9);
}

#[test]
fn custom_page_size_follows_orientation() {
    let mut settings = CustomLabelSettings {
        label_width: 100.0,
        label_height: 70.0,
        ..CustomLabelSettings::default()
    };
    settings.orientation = Orientation::Landscape;
    assert_eq!(settings.page_size(), (100.0, 70.0));
    settings.orientation = Orientation::Portrait;
    assert_eq!(settings.page_size(), (70.0, 100.0));
}

#[test]
fn custom_scale_and_fonts() {
    let settings = CustomLabelSettings {
        label_width: 60.0,
        label_height: 90.0,
        rows: 3,
        cols: 2,
        auto_fit: true,
        text_scale: 150,
        orientation: Orientation::Portrait,
    };
    // min side 60mm -> factor 2, times 150%
    assert!((settings.scale() - 3.0).abs() < 1e-9);
    assert_eq!(settings.copies(), 6);
    assert_eq!(settings.cell_size(), (30.0, 30.0));

    let fonts = settings.font_sizes(&FontStyles::default());
    assert!((fonts.code - 30.0 * 0.18 * PX_PER_MM).abs() < 1e-9);
    assert!((fonts.qty - 30.0 * 0.22 * PX_PER_MM).abs() < 1e-9);

    let mut styles = FontStyles::default();
    styles.code = FontStyle {
        size: 200,
        bold: false,
        italic: true,
    };
    let bigger = settings.font_sizes(&styles);
    assert!((bigger.code - 2.0 * fonts.code).abs() < 1e-9);
    assert_eq!(styles.code.style(), "italic");
    assert_eq!(styles.qty.weight(true), "900");
    assert_eq!(styles.date.weight(false), "normal");

    let fixed = CustomLabelSettings {
        auto_fit: false,
        ..settings
    };
    assert!((fixed.scale() - 1.5).abs() < 1e-9);
}

#[test]
fn custom_settings_are_clamped() {
    let settings = CustomLabelSettings {
        rows: 0,
        cols: 40,
        text_scale: 10,
        ..CustomLabelSettings::default()
    }
    .clamped();
    assert_eq!(settings.rows, 1);
    assert_eq!(settings.cols, 10);
    assert_eq!(settings.text_scale, 50);
}

#[test]
fn preview_fits_box() {
    let settings = CustomLabelSettings::default();
    let scale = settings.preview_scale();
    assert!(settings.label_width * PX_PER_MM * scale <= 350.0 + 1e-9);
    assert!(settings.label_height * PX_PER_MM * scale <= 288.0 + 1e-9);
}

#[test]
fn lot_and_date_formatting() {
    assert_eq!(format_lot(1_000_000), "0001000000");
    assert_eq!(format_lot(42), "0000000042");
    let date = NaiveDate::from_ymd_opt(2024, 3, 7).unwrap();
    assert_eq!(format_thai_date(date), "07/03/2567");
}

#[test]
fn paper_sizes() {
    assert_eq!(parse_paper_size("100x70"), Some((100.0, 70.0)));
    assert_eq!(parse_paper_size(" 50 X 30 "), Some((50.0, 30.0)));
    assert_eq!(parse_paper_size("0x30"), None);
    assert_eq!(parse_paper_size("A4"), None);
    assert!(PAPER_SIZES.iter().any(|p| p.label == "A4" && p.group == "paper"));
}

#[test]
fn settings_read_from_partial_json() {
    let settings: LabelSettings = serde_json::from_str(r#"{"copies": 6}"#).unwrap();
    assert_eq!(settings.copies, 6);
    assert_eq!(settings.label_width, 50.0);

    let custom: CustomLabelSettings = serde_json::from_str(r#"{"orientation": "landscape"}"#).unwrap();
    assert_eq!(custom.orientation, Orientation::Landscape);
    assert_eq!(custom.rows, 1);
}
