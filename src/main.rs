/// The `egui` re-export for building native GUIs with the eframe framework.
use eframe::egui::{self, Color32, ColorImage, Pos2, Rect, Sense, TextureHandle, TextureOptions, Vec2};
/// The `egui_plot` crate for plotting the signal trace.
use egui_plot::{Line, Plot, PlotPoints};

use anyhow::Context;
use image::RgbaImage;
use rand::rngs::ThreadRng;

use secm_viz::backdrop::Background;
use secm_viz::clock::{Clock, SystemClock};
use secm_viz::config::SecmConfig;
use secm_viz::illustration::{DetectorDemo, DiffusionDemo, ElectrodePlume, SecmScan, SecmViews, detector, diffusion, plume};
use secm_viz::pixel_matrix::{self, PixelMatrix};
use secm_viz::reaction::{RaceState, ReactionRace};
use secm_viz::scanner::HitTest;
use secm_viz::schedule::{FrameLoop, TickSchedule};
use secm_viz::signal::Response;
use secm_viz::surface::EguiSurface;

const BACKDROP_CONTOURS: usize = 14;

// ===================================================================================
// Pages
// ===================================================================================

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum PageKind {
    Images,
    Catalysis,
    Echem,
    Secm,
}

impl PageKind {
    const ALL: [PageKind; 4] = [PageKind::Images, PageKind::Catalysis, PageKind::Echem, PageKind::Secm];

    fn title(self) -> &'static str {
        match self {
            PageKind::Images => "Images",
            PageKind::Catalysis => "Catalysis",
            PageKind::Echem => "Electrochemistry",
            PageKind::Secm => "SECM",
        }
    }
}

/// Per-page state. Dropping it stops every loop the page started.
enum PageBody {
    Images {
        matrix: PixelMatrix,
        texture: Option<TextureHandle>,
    },
    Catalysis {
        race: ReactionRace,
        diffusion: DiffusionDemo,
        _frame: FrameLoop,
    },
    Echem {
        detector: DetectorDemo,
        _frame: FrameLoop,
    },
    Secm {
        scan: SecmScan,
        plume: ElectrodePlume,
        image: Option<(TextureHandle, u64)>,
        _plume_frame: FrameLoop,
    },
}

struct Page {
    kind: PageKind,
    background: Background,
    body: PageBody,
}

// ===================================================================================
// Main Application
// ===================================================================================

/// The primary application state:
/// - the page being shown, which owns all of its simulation state
/// - the SECM parameters, editable while the scan is stopped
/// - the "running" flag for the scan and a "needs reset" flag set by the sliders
struct SecmApp {
    // -------------- Config / UI --------------
    params: SecmConfig,
    running: bool,
    needs_reset: bool,
    param_error: Option<String>,

    // -------------- Host services --------------
    schedule: TickSchedule,
    clock: SystemClock,
    rng: ThreadRng,
    scan_frame: Option<FrameLoop>,

    // -------------- Current page --------------
    page: Option<Page>,
    selected: PageKind,
}

impl SecmApp {
    fn new(params: SecmConfig) -> Self {
        Self {
            params,
            running: false,
            needs_reset: false,
            param_error: None,
            schedule: TickSchedule::new(),
            clock: SystemClock::new(),
            rng: rand::rng(),
            scan_frame: None,
            page: None,
            selected: PageKind::Secm,
        }
    }

    /// Builds the selected page if it is not the one on screen, tearing the
    /// old one down first.
    fn ensure_page(&mut self, viewport: Vec2) {
        if self.page.as_ref().is_some_and(|p| p.kind == self.selected) {
            return;
        }
        self.page = None;
        self.scan_frame = None;
        self.running = false;

        let body = match self.selected {
            PageKind::Images => PageBody::Images {
                matrix: PixelMatrix::default(),
                texture: None,
            },
            PageKind::Catalysis => PageBody::Catalysis {
                race: ReactionRace::new(),
                diffusion: DiffusionDemo::new(),
                _frame: self.schedule.request_tick(),
            },
            PageKind::Echem => PageBody::Echem {
                detector: DetectorDemo::default(),
                _frame: self.schedule.request_tick(),
            },
            PageKind::Secm => PageBody::Secm {
                scan: SecmScan::new(self.params.clone()),
                plume: ElectrodePlume::new(&mut self.rng),
                image: None,
                _plume_frame: self.schedule.request_tick(),
            },
        };
        log::debug!("showing {:?} page", self.selected);
        self.page = Some(Page {
            kind: self.selected,
            background: Background::new(&self.schedule, viewport, BACKDROP_CONTOURS),
            body,
        });
    }

    /// Rebuilds the scan from the current parameters if they validate.
    fn reset_simulation(&mut self) {
        if let Err(e) = self.params.validate() {
            log::warn!("rejected parameters: {e}");
            self.param_error = Some(e.to_string());
            return;
        }
        self.param_error = None;
        if let Some(Page {
            body: PageBody::Secm { scan, image, .. },
            ..
        }) = &mut self.page
        {
            *scan = SecmScan::new(self.params.clone());
            *image = None;
        }
        self.needs_reset = false;
    }

    fn config_panel(&mut self, ctx: &egui::Context) {
        egui::SidePanel::left("config_panel").show(ctx, |ui| {
            ui.heading("Scan Controls");

            // Sliders: only matter if we haven't started or we want to reset
            if !self.running {
                let p = &mut self.params;
                let mut changed = false;
                changed |= ui.add(egui::Slider::new(&mut p.scan.step, 0.5..=10.0).text("Scan step")).changed();
                changed |= ui.add(egui::Slider::new(&mut p.scan.row_step, 2.0..=40.0).text("Row step")).changed();
                changed |= ui.add(egui::Slider::new(&mut p.electrode.bar_width, 10.0..=120.0).text("Electrode width")).changed();
                changed |= ui
                    .add(egui::Slider::new(&mut p.signal.collision_weight, 1.0..=50.0).text("Collision weight"))
                    .changed();
                changed |= ui.add(egui::Slider::new(&mut p.signal.decrement, 0.0..=50.0).text("Signal decay")).changed();
                changed |= ui.add(egui::Slider::new(&mut p.signal.max, 50.0..=500.0).text("Max signal")).changed();
                changed |= ui
                    .add(egui::Slider::new(&mut p.emitter.spawn_chance, 0.0..=1.0).text("Spawn chance"))
                    .changed();
                changed |= ui
                    .add(egui::Slider::new(&mut p.raster.intensity_scale, 5.0..=80.0).text("Image contrast"))
                    .changed();
                ui.horizontal(|ui| {
                    ui.label("Response");
                    changed |= ui.radio_value(&mut p.signal.response, Response::Accumulate, "Accumulate").changed();
                    changed |= ui.radio_value(&mut p.signal.response, Response::Latch, "Latch").changed();
                });
                ui.horizontal(|ui| {
                    ui.label("Hit test");
                    changed |= ui.radio_value(&mut p.electrode.hit_test, HitTest::TopFace, "Top face").changed();
                    changed |= ui
                        .radio_value(&mut p.electrode.hit_test, HitTest::BoundingBox, "Bounding box")
                        .changed();
                });
                if changed {
                    self.needs_reset = true;
                }
            } else {
                ui.label("Parameters locked while running. Stop to change.");
            }

            if let Some(err) = &self.param_error {
                ui.colored_label(Color32::LIGHT_RED, err);
            }

            ui.separator();

            // Start / Stop
            if self.running {
                if ui.button("Stop").clicked() {
                    self.running = false;
                    self.scan_frame = None;
                }
            } else if ui.button("Start").clicked() {
                if self.needs_reset {
                    self.reset_simulation();
                }
                if !self.needs_reset {
                    self.running = true;
                    self.scan_frame = Some(self.schedule.request_tick());
                }
            }

            // Reset
            if ui.button("Reset").clicked() {
                self.reset_simulation();
                self.running = false;
                self.scan_frame = None;
            }
        });
    }
}

impl eframe::App for SecmApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let screen = ctx.screen_rect();
        let now = self.clock.now();
        let dt = ctx.input(|i| i.stable_dt);

        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading("SECM, visually");
                ui.separator();
                for kind in PageKind::ALL {
                    ui.selectable_value(&mut self.selected, kind, kind.title());
                }
            });
        });

        self.ensure_page(screen.size());
        if self.selected == PageKind::Secm {
            self.config_panel(ctx);
        }

        // ------------------------------------
        // Backdrop behind everything
        // ------------------------------------
        if let Some(page) = &mut self.page {
            if let Some(effect) = page.background.effect_mut() {
                effect.resize(screen.size(), now);
                effect.update(dt, now);
            }
            let logical = page.background.effect_mut().map_or(screen.size(), |e| e.viewport());
            let painter = ctx.layer_painter(egui::LayerId::background());
            let mut surface = EguiSurface::new(&painter, screen, logical);
            page.background.paint(&mut surface);
        }

        let running = self.running;
        let Some(page) = &mut self.page else {
            return;
        };
        let rng = &mut self.rng;

        egui::CentralPanel::default()
            .frame(egui::Frame::none().inner_margin(16.0))
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| match &mut page.body {
                    PageBody::Images { matrix, texture } => images_page(ui, matrix, texture),
                    PageBody::Catalysis { race, diffusion, .. } => catalysis_page(ui, race, diffusion, now, rng),
                    PageBody::Echem { detector, .. } => echem_page(ui, detector, rng),
                    PageBody::Secm { scan, plume, image, .. } => {
                        secm_page(ui, scan, plume, image, running, now, rng)
                    }
                });
            });

        // Request another frame only while some illustration is animating.
        if self.schedule.is_active() {
            ctx.request_repaint();
        }
    }
}

// ===================================================================================
// Page bodies
// ===================================================================================

fn to_color_image(buffer: &RgbaImage) -> ColorImage {
    let size = [buffer.width() as usize, buffer.height() as usize];
    ColorImage::from_rgba_unmultiplied(size, buffer.as_raw())
}

fn images_page(ui: &mut egui::Ui, matrix: &mut PixelMatrix, texture: &mut Option<TextureHandle>) {
    ui.heading("Images are data");
    ui.label("Every pixel is a number. Edit the grid and watch the picture follow.");
    ui.add_space(8.0);

    let mut edited = texture.is_none();
    ui.horizontal(|ui| {
        egui::Grid::new("pixel_matrix").spacing([4.0, 4.0]).show(ui, |ui| {
            for row in 0..pixel_matrix::SIZE {
                for col in 0..pixel_matrix::SIZE {
                    let mut value = matrix.get(row, col) as i64;
                    if ui.add(egui::DragValue::new(&mut value).range(0..=255)).changed() {
                        matrix.set(row, col, value);
                        edited = true;
                    }
                }
                ui.end_row();
            }
        });

        match texture {
            Some(tex) if edited => tex.set(to_color_image(&matrix.to_rgba()), TextureOptions::NEAREST),
            Some(_) => {}
            None => {
                let image = to_color_image(&matrix.to_rgba());
                *texture = Some(ui.ctx().load_texture("pixel_matrix", image, TextureOptions::NEAREST));
            }
        }
        if let Some(tex) = texture {
            let (rect, _) = ui.allocate_exact_size(Vec2::splat(200.0), Sense::hover());
            ui.painter().image(tex.id(), rect, unit_uv(), Color32::WHITE);
        }
    });
}

fn catalysis_page(
    ui: &mut egui::Ui,
    race: &mut ReactionRace,
    diffusion: &mut DiffusionDemo,
    now: std::time::Duration,
    rng: &mut ThreadRng,
) {
    ui.heading("Catalysis");
    race.advance(now);

    let idle = race.state() == RaceState::Idle;
    if ui.add_enabled(idle, egui::Button::new("Start Reaction")).clicked() {
        race.start(now);
    }
    if race.state() == RaceState::Finished && ui.button("Run again").clicked() {
        race.start(now);
    }

    ui.label("Raw materials + energy → products");
    ui.add(egui::ProgressBar::new(race.uncatalysed() / 100.0).text(format!("{:.0}%", race.uncatalysed())));
    ui.label("Raw materials + energy + catalyst → products");
    ui.add(
        egui::ProgressBar::new(race.catalysed() / 100.0)
            .fill(Color32::from_rgb(34, 197, 94))
            .text(format!("{:.0}%", race.catalysed())),
    );
    ui.label(
        "A catalyst speeds a reaction up by offering a pathway that needs less energy, \
         and comes out of it unchanged.",
    );

    ui.add_space(16.0);
    ui.heading("Challenging observation");
    let (response, painter) = ui.allocate_painter(diffusion::CANVAS, Sense::hover());
    let mut surface = EguiSurface::new(&painter, response.rect, diffusion::CANVAS);
    diffusion.tick(rng, Some(&mut surface));
    ui.label(
        "Products diffuse away from the catalyst in every direction, which makes it hard \
         to collect them all and judge how good the catalyst is.",
    );
}

fn echem_page(ui: &mut egui::Ui, detector: &mut DetectorDemo, rng: &mut ThreadRng) {
    ui.heading("Electrochemical detection");
    ui.label("Molecules reaching the electrode react and produce a current.");

    let (response, painter) = ui.allocate_painter(detector::CANVAS, Sense::hover());
    let mut surface = EguiSurface::new(&painter, response.rect, detector::CANVAS);
    detector.tick(rng, Some(&mut surface));

    let mut concentration = detector.concentration();
    ui.add(egui::Slider::new(&mut concentration, 0..=detector::MAX_CONCENTRATION).text("Concentration %"));
    detector.set_concentration(concentration);
}

fn secm_page(
    ui: &mut egui::Ui,
    scan: &mut SecmScan,
    plume: &mut ElectrodePlume,
    image: &mut Option<(TextureHandle, u64)>,
    running: bool,
    now: std::time::Duration,
    rng: &mut ThreadRng,
) {
    ui.heading("Combined them all: SECM");

    // 3D orientation
    ui.label("3D view orientation (drag to rotate)");
    let (response, painter) = ui.allocate_painter(plume::CANVAS, Sense::drag());
    let delta = response.drag_delta();
    plume.camera_mut().drag(glam::Vec2::new(delta.x, delta.y));
    plume.tick(rng);
    plume.render(&mut EguiSurface::new(&painter, response.rect, plume::CANVAS));

    ui.add_space(12.0);
    let size = scan.canvas();
    let view = Vec2::new(size.x, size.y);

    egui::Grid::new("secm_views").spacing([16.0, 12.0]).show(ui, |ui| {
        ui.label("Catalyst layer (XY view)");
        ui.label("Electrode movement (XZ view)");
        ui.end_row();

        let (top, top_painter) = ui.allocate_painter(view, Sense::hover());
        let (side, side_painter) = ui.allocate_painter(view, Sense::hover());
        let mut catalyst = EguiSurface::new(&top_painter, top.rect, size);
        let mut side = EguiSurface::new(&side_painter, side.rect, size);
        let mut views = SecmViews {
            catalyst: &mut catalyst,
            side: &mut side,
        };
        if running {
            scan.tick(now, rng, Some(&mut views));
        } else {
            scan.render(&mut views);
        }
        ui.end_row();

        ui.label("Signal vs position");
        ui.label("2D signal image");
        ui.end_row();

        let max = scan.signal().max() as f64;
        Plot::new("signal_trace")
            .width(view.x)
            .height(view.y)
            .include_x(0.0)
            .include_x(size.x as f64)
            .include_y(0.0)
            .include_y(max)
            .allow_scroll(false)
            .allow_drag(false)
            .show(ui, |plot_ui| {
                let points = scan.row_trace();
                if !points.is_empty() {
                    plot_ui.line(Line::new(PlotPoints::from(points)).color(Color32::from_rgb(50, 205, 50)));
                }
            });

        let raster = scan.image();
        match image {
            Some((tex, version)) => {
                if *version != raster.version() {
                    tex.set(to_color_image(raster.buffer()), TextureOptions::NEAREST);
                    *version = raster.version();
                }
            }
            None => {
                let tex = ui
                    .ctx()
                    .load_texture("signal_image", to_color_image(raster.buffer()), TextureOptions::NEAREST);
                *image = Some((tex, raster.version()));
            }
        }
        let (rect, _) = ui.allocate_exact_size(view, Sense::hover());
        ui.painter().rect_filled(rect, 4.0, Color32::from_rgb(17, 24, 39));
        if let Some((tex, _)) = image {
            ui.painter().image(tex.id(), rect, unit_uv(), Color32::WHITE);
        }
        ui.end_row();
    });

    ui.add_space(12.0);
    ui.label(format!(
        "Probe at ({:.0}, {:.0}), signal {:.0}, passes {}",
        scan.electrode().x,
        scan.electrode().y,
        scan.signal().decay(),
        scan.scanner().passes(),
    ));
    ui.label(
        "The electrode rasters left to right, top to bottom. Over the active area it \
         collects more products, so the signal rises; it decays once the probe moves on, \
         leaving a trail in the image.",
    );
}

fn unit_uv() -> Rect {
    Rect::from_min_max(Pos2::ZERO, Pos2::new(1.0, 1.0))
}

// ===================================================================================
// main
// ===================================================================================

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let params = match std::env::args().nth(1) {
        Some(path) => SecmConfig::load(&path).with_context(|| format!("loading preset {path}"))?,
        None => SecmConfig::default(),
    };

    if let Err(e) = rayon::ThreadPoolBuilder::new()
        .num_threads(num_cpus::get_physical())
        .build_global()
    {
        log::warn!("using the default rayon pool: {e}");
    }

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([1280.0, 900.0]),
        ..Default::default()
    };

    eframe::run_native(
        "SECM Visualiser",
        native_options,
        Box::new(|_cc| Ok(Box::new(SecmApp::new(params)))),
    )
    .map_err(|e| anyhow::anyhow!("{e}"))
}
