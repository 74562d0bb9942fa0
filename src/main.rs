//! Shows the dial's curved labels in a window.
//!
//! Usage: `payment-dial <font.ttf> [top text] [bottom text] [--guides]`

use std::env;
use std::error::Error;
use std::process;
use std::sync::Arc;

use log::{debug, error, info};
use payment_dial::{
    render_rounded_text, Alignment, Color, DialTextConfig, FontBook, Label, RasterImage, Size,
};
use pixels::{Pixels, SurfaceTexture};
use winit::dpi::{LogicalSize, PhysicalSize};
use winit::event::{Event, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::window::{Window, WindowBuilder};

const WINDOW_SIZE: f64 = 300.0;
const LABEL_FAMILY: &str = "Dial";
const LABEL_SIZE: f32 = 45.0;
const LABEL_KERN: f32 = 1.5;
const BACKGROUND: Color = Color::new(0xff, 0xff, 0xff);

struct Options {
    font_path: String,
    top: String,
    bottom: String,
    guides: bool,
}

fn parse_args() -> Option<Options> {
    let mut guides = false;
    let mut positional = Vec::new();
    for arg in env::args().skip(1) {
        if arg == "--guides" {
            guides = true;
        } else {
            positional.push(arg);
        }
    }

    let mut positional = positional.into_iter();
    Some(Options {
        font_path: positional.next()?,
        top: positional
            .next()
            .unwrap_or_else(|| "ACCOUNT BALANCE".to_string()),
        bottom: positional
            .next()
            .unwrap_or_else(|| "SHOW ME THE MONEY".to_string()),
        guides,
    })
}

fn dial_label(text: &str) -> Label {
    Label::new(text)
        .font(LABEL_FAMILY, LABEL_SIZE)
        .color(Color::from_unit(0.54, 0.54, 0.54, 1.0))
        .kern(LABEL_KERN)
        .alignment(Alignment::Center)
}

fn main() {
    env_logger::init();

    let Some(options) = parse_args() else {
        eprintln!("usage: payment-dial <font.ttf> [top text] [bottom text] [--guides]");
        process::exit(2);
    };

    if let Err(err) = run(options) {
        error!("{err}");
        process::exit(1);
    }
}

fn run(options: Options) -> Result<(), Box<dyn Error>> {
    let data = std::fs::read(&options.font_path)?;
    let book = FontBook::new(LABEL_FAMILY, data)?;
    let top = dial_label(&options.top);
    let bottom = dial_label(&options.bottom);

    let event_loop = EventLoop::new()?;
    let window = WindowBuilder::new()
        .with_title("Payment Dial")
        .with_inner_size(LogicalSize::new(WINDOW_SIZE, WINDOW_SIZE))
        .build(&event_loop)?;
    let window = Arc::new(window);

    let size = window.inner_size();
    let mut fb_size = size;
    let surface_texture = SurfaceTexture::new(size.width, size.height, &window);
    let mut pixels = Pixels::new(size.width, size.height, surface_texture)?;

    let render = |window: &Window| -> Option<RasterImage> {
        let scale = window.scale_factor();
        let logical: LogicalSize<f64> = window.inner_size().to_logical(scale);
        let config = DialTextConfig::builder()
            .device_scale(scale)
            .stroke_guides(options.guides)
            .build();
        match render_rounded_text(
            &top,
            &bottom,
            Size::new(logical.width, logical.height),
            &book,
            &config,
        ) {
            Ok(image) => image,
            Err(err) => {
                error!("failed to render labels: {err}");
                None
            }
        }
    };

    let mut image = render(window.as_ref());
    info!("rendering {:?} / {:?}", options.top, options.bottom);

    let window_clone = window.clone();
    event_loop.run(move |event, window_target| {
        window_target.set_control_flow(ControlFlow::Wait);
        match event {
            Event::WindowEvent { event, .. } => match event {
                WindowEvent::CloseRequested => {
                    window_target.exit();
                }
                WindowEvent::Resized(new_size) => {
                    fb_size = new_size;
                    let _ = pixels.resize_buffer(new_size.width, new_size.height);
                    let _ = pixels.resize_surface(new_size.width, new_size.height);
                    // layout runs once per size change, never per frame
                    image = render(window_clone.as_ref());
                    window_clone.request_redraw();
                }
                WindowEvent::RedrawRequested => {
                    blit(image.as_ref(), pixels.frame_mut(), fb_size);
                    if let Err(err) = pixels.render() {
                        error!("present failed: {err}");
                        window_target.exit();
                    }
                }
                _ => {}
            },
            _ => {}
        }
    })?;

    Ok(())
}

/// Composites the premultiplied label image over the background.
fn blit(image: Option<&RasterImage>, frame: &mut [u8], size: PhysicalSize<u32>) {
    let (r, g, b) = BACKGROUND.as_tuple();
    let background = [r, g, b, 0xff];
    for px in frame.chunks_exact_mut(4) {
        px.copy_from_slice(&background);
    }

    let Some(image) = image else {
        return;
    };
    let width = image.width.min(size.width);
    let height = image.height.min(size.height);
    debug!("blitting {width}x{height} of {}x{}", image.width, image.height);

    for y in 0..height {
        for x in 0..width {
            let Some(src) = image.pixel(x, y) else {
                continue;
            };
            let idx = ((y * size.width + x) * 4) as usize;
            let inverse = 255 - u32::from(src[3]);
            for channel in 0..3 {
                let bg = u32::from(background[channel]);
                let out = u32::from(src[channel]) + (bg * inverse + 127) / 255;
                frame[idx + channel] = out.min(255) as u8;
            }
        }
    }
}
