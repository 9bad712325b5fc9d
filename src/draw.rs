use std::borrow::Cow;
use std::convert::Infallible;

use embedded_graphics::{
    mono_font::{MonoFont, MonoTextStyle},
    pixelcolor::{BinaryColor, Rgb888},
    prelude::*,
    primitives::{Circle, PrimitiveStyle, Rectangle, RoundedRectangle, Triangle},
    text::{renderer::TextRenderer, Baseline, Text},
};
use embedded_text::{
    alignment::{HorizontalAlignment, VerticalAlignment},
    style::TextBoxStyleBuilder,
    TextBox,
};

use crate::constants::{ICON_SIZE, OVERLAY_ALPHA};
use crate::vframebuf::{Bitmap, Mask};

/// Overlay foreground (text, icons, bar fill).
pub const OVERLAY_FG: Rgb888 = Rgb888::WHITE;
/// Overlay background (label boxes, bar track).
pub const OVERLAY_BG: Rgb888 = Rgb888::BLACK;

/// Glyphs used for the button hints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Icon {
    Previous,
    Next,
    PlayPause,
    Info,
}

/// Rasterise one layer into a coverage mask, then blend it onto `bitmap`.
pub fn blended<F>(bitmap: &mut Bitmap, color: Rgb888, alpha: u8, paint: F)
where
    F: FnOnce(&mut Mask) -> Result<(), Infallible>,
{
    let mut mask = Mask::new(bitmap.width() as u32, bitmap.height() as u32, BinaryColor::Off);
    let Ok(()) = paint(&mut mask);
    bitmap.blend_mask(&mask, color, alpha);
}

/// Size of `text` set in `font`, top baseline.
pub fn text_size(text: &str, font: &MonoFont) -> Size {
    MonoTextStyle::new(font, BinaryColor::On)
        .measure_string(text, Point::zero(), Baseline::Top)
        .bounding_box
        .size
}

/// Clip `text` to `max_width` pixels, ending in "..." when anything was cut.
pub fn fit_text<'a>(text: &'a str, font: &MonoFont, max_width: u32) -> Cow<'a, str> {
    if text_size(text, font).width <= max_width {
        return Cow::Borrowed(text);
    }
    let advance = font.character_size.width + font.character_spacing;
    let keep = (max_width / advance.max(1)).saturating_sub(3) as usize;
    let mut cut: String = text.chars().take(keep).collect();
    cut.push_str("...");
    Cow::Owned(cut)
}

/// Rounded rectangle with corner radius confined to the box.
pub fn rounded(area: Rectangle, radius: u32) -> RoundedRectangle {
    let r = radius.min(area.size.width / 2).min(area.size.height / 2);
    RoundedRectangle::with_equal_corners(area, Size::new(r, r))
}

pub fn fill_rounded<D>(target: &mut D, area: Rectangle, radius: u32) -> Result<(), D::Error>
where
    D: DrawTarget<Color = BinaryColor>,
{
    if area.size.width == 0 || area.size.height == 0 {
        return Ok(());
    }
    rounded(area, radius)
        .into_styled(PrimitiveStyle::with_fill(BinaryColor::On))
        .draw(target)
}

pub fn draw_text<D>(target: &mut D, text: &str, top_left: Point, font: &MonoFont) -> Result<(), D::Error>
where
    D: DrawTarget<Color = BinaryColor>,
{
    Text::with_baseline(text, top_left, MonoTextStyle::new(font, BinaryColor::On), Baseline::Top)
        .draw(target)?;
    Ok(())
}

/// Single line of text centred in a `width` wide box.
pub fn draw_text_centered<D>(
    target: &mut D,
    text: &str,
    top_left: Point,
    width: u32,
    font: &MonoFont,
) -> Result<(), D::Error>
where
    D: DrawTarget<Color = BinaryColor>,
{
    let style = TextBoxStyleBuilder::new()
        .alignment(HorizontalAlignment::Center)
        .vertical_alignment(VerticalAlignment::Middle)
        .build();
    let area = Rectangle::new(top_left, Size::new(width, font.character_size.height));
    TextBox::with_textbox_style(text, area, MonoTextStyle::new(font, BinaryColor::On), style).draw(target)?;
    Ok(())
}

/// Icon glyph inside an `ICON_SIZE` square at `top_left`.
pub fn draw_icon<D>(target: &mut D, icon: Icon, top_left: Point) -> Result<(), D::Error>
where
    D: DrawTarget<Color = BinaryColor>,
{
    let s = ICON_SIZE as i32;
    let fill = PrimitiveStyle::with_fill(BinaryColor::On);
    let at = |x: i32, y: i32| top_left + Point::new(x, y);
    let bar = |x: i32| Rectangle::new(at(x, 3), Size::new(3, (s - 6) as u32));

    match icon {
        Icon::Previous => {
            bar(2).into_styled(fill).draw(target)?;
            Triangle::new(at(s - 3, 3), at(s - 3, s - 3), at(5, s / 2)).into_styled(fill).draw(target)?;
        }
        Icon::Next => {
            Triangle::new(at(2, 3), at(2, s - 3), at(s - 6, s / 2)).into_styled(fill).draw(target)?;
            bar(s - 5).into_styled(fill).draw(target)?;
        }
        Icon::PlayPause => {
            Triangle::new(at(1, 3), at(1, s - 3), at(s / 2 - 1, s / 2)).into_styled(fill).draw(target)?;
            bar(s / 2 + 1).into_styled(fill).draw(target)?;
            bar(s - 4).into_styled(fill).draw(target)?;
        }
        Icon::Info => {
            Circle::new(at(s / 2 - 2, 1), 4).into_styled(fill).draw(target)?;
            Rectangle::new(at(s / 2 - 2, 7), Size::new(4, (s - 9) as u32)).into_styled(fill).draw(target)?;
        }
    }
    Ok(())
}

/// Background box then content, both blended at the overlay alpha.
///
/// `content` paints the foreground layer; the box is `content_size`
/// grown by `border` on every side.
pub fn draw_label<F>(bitmap: &mut Bitmap, top_left: Point, content_size: Size, border: u32, radius: u32, content: F)
where
    F: FnOnce(&mut Mask, Point) -> Result<(), Infallible>,
{
    let frame = Rectangle::new(top_left, content_size + Size::new(2 * border, 2 * border));
    blended(bitmap, OVERLAY_BG, OVERLAY_ALPHA, |mask| fill_rounded(mask, frame, radius));
    let inner = top_left + Point::new(border as i32, border as i32);
    blended(bitmap, OVERLAY_FG, OVERLAY_ALPHA, |mask| content(mask, inner));
}
