use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Style, Stylize},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

/// Page banner above a content region: a required heading, an optional
/// subheading grouped under it, and an inverse palette flag. Purely
/// structural; the caller renders whatever it wants into the returned
/// content area.
pub struct PageHeaderLayout<'a> {
    heading: &'a str,
    subheading: Option<&'a str>,
    inverse: bool,
}

impl<'a> PageHeaderLayout<'a> {
    pub fn new(heading: &'a str) -> Self {
        Self {
            heading,
            subheading: None,
            inverse: false,
        }
    }

    pub fn subheading(mut self, subheading: &'a str) -> Self {
        self.subheading = Some(subheading);
        self
    }

    pub fn inverse(mut self, inverse: bool) -> Self {
        self.inverse = inverse;
        self
    }

    pub fn banner_height(&self) -> u16 {
        if self.subheading.is_some() {
            2
        } else {
            1
        }
    }

    /// Split an area into (banner, content).
    pub fn split(&self, area: Rect) -> (Rect, Rect) {
        let [banner, content] =
            Layout::vertical([Constraint::Length(self.banner_height()), Constraint::Min(0)])
                .areas(area);
        (banner, content)
    }

    /// Render the banner and hand back the content region.
    pub fn render(&self, frame: &mut Frame, area: Rect) -> Rect {
        let (banner_area, content_area) = self.split(area);

        let banner_style = if self.inverse {
            Style::default().bg(Color::Magenta).fg(Color::White)
        } else {
            Style::default().bg(Color::DarkGray).fg(Color::White)
        };

        let mut lines = vec![Line::from(vec![Span::styled(
            format!(" {} ", self.heading),
            banner_style.bold(),
        )])];
        if let Some(subheading) = self.subheading {
            lines.push(Line::from(Span::styled(
                format!(" {} ", subheading),
                banner_style,
            )));
        }

        let banner = Paragraph::new(lines).style(banner_style);
        frame.render_widget(banner, banner_area);

        content_area
    }
}
