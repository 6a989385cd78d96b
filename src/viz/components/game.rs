use ratatui::{prelude::*, widgets::*};

use crate::gym::{Direction, Pos, Snapshot};

const HEAD: &str = "██";
const BODY: &str = "▓▓";
const FOOD: &str = "()";
const OBSTACLE: &str = "##";

/// Latest frame received from the training loop
pub struct GameFrame {
    pub snapshot: Snapshot,
    pub episode: u32,
    pub epsilon: f32,
    pub record: u32,
}

/// Game tab: the board and a side panel of episode stats
#[derive(Default)]
pub struct Game {
    frame: Option<GameFrame>,
}

impl Game {
    pub fn update(&mut self, frame: GameFrame) {
        self.frame = Some(frame);
    }
}

impl WidgetRef for Game {
    fn render_ref(&self, area: Rect, buf: &mut Buffer) {
        let Some(frame) = &self.frame else {
            Paragraph::new("Waiting for the first frame (run with --render)")
                .dark_gray()
                .block(Block::bordered().border_type(BorderType::Rounded).title("Game"))
                .render(area, buf);
            return;
        };

        let board_width = (frame.snapshot.width as u16).saturating_mul(2).saturating_add(2);
        let [board_area, hud_area] =
            Layout::horizontal([Constraint::Length(board_width), Constraint::Fill(1)])
                .areas(area);

        Board::new(&frame.snapshot).render(board_area, buf);

        let stat = |name: &'static str, value: String| {
            Line::from(vec![name.bold(), ": ".into(), value.cyan()])
        };
        Paragraph::new(vec![
            stat("Episode", frame.episode.to_string()),
            stat("Score", frame.snapshot.score.to_string()),
            stat("Level", frame.snapshot.level.to_string()),
            stat("Record", frame.record.to_string()),
            stat("Length", frame.snapshot.snake.len().to_string()),
            stat("Epsilon", format!("{:.3}", frame.epsilon)),
        ])
        .block(
            Block::bordered()
                .border_type(BorderType::Rounded)
                .title("Stats")
                .padding(Padding::horizontal(1)),
        )
        .render(hud_area, buf);
    }
}

/// The grid, two terminal columns per cell
pub struct Board<'a> {
    snapshot: &'a Snapshot,
}

impl<'a> Board<'a> {
    pub fn new(snapshot: &'a Snapshot) -> Self {
        Self { snapshot }
    }

    fn head_symbol(heading: Direction) -> &'static str {
        match heading {
            Direction::Right => "█>",
            Direction::Left => "<█",
            Direction::Up => "/\\",
            Direction::Down => "\\/",
        }
    }
}

impl Widget for Board<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::bordered()
            .border_type(BorderType::Rounded)
            .title(format!("Level {}", self.snapshot.level));
        let inner = block.inner(area);
        block.render(area, buf);

        let mut draw = |pos: Pos, symbol: &str, style: Style| {
            let (col, row) = pos;
            if col < 0 || row < 0 {
                return;
            }
            let x = inner.x as i32 + col * 2;
            let y = inner.y as i32 + row;
            if x + 1 < inner.right() as i32 && y < inner.bottom() as i32 {
                buf.set_string(x as u16, y as u16, symbol, style);
            }
        };

        for &pos in &self.snapshot.obstacles {
            draw(pos, OBSTACLE, Style::default().dark_gray());
        }
        draw(self.snapshot.food, FOOD, Style::default().light_red());
        for &pos in self.snapshot.snake.iter().skip(1) {
            draw(pos, BODY, Style::default().green());
        }
        if let Some(&head) = self.snapshot.snake.first() {
            let symbol = if self.snapshot.snake.len() > 1 {
                Self::head_symbol(self.snapshot.heading)
            } else {
                HEAD
            };
            draw(head, symbol, Style::default().light_green().bold());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot() -> Snapshot {
        Snapshot {
            width: 5,
            height: 5,
            snake: vec![(2, 2), (1, 2), (0, 2)],
            food: (4, 0),
            obstacles: vec![(3, 4)],
            heading: Direction::Right,
            score: 0,
            level: 1,
        }
    }

    fn cell(buf: &Buffer, pos: Pos) -> String {
        let x = 1 + pos.0 as u16 * 2;
        let y = 1 + pos.1 as u16;
        format!("{}{}", buf.get(x, y).symbol(), buf.get(x + 1, y).symbol())
    }

    #[test]
    fn board_draws_every_piece() {
        let snapshot = snapshot();
        let area = Rect::new(0, 0, 12, 7);
        let mut buf = Buffer::empty(area);
        Board::new(&snapshot).render(area, &mut buf);

        assert_eq!(cell(&buf, (2, 2)), "█>", "head points along the heading");
        assert_eq!(cell(&buf, (1, 2)), BODY);
        assert_eq!(cell(&buf, (0, 2)), BODY);
        assert_eq!(cell(&buf, (4, 0)), FOOD);
        assert_eq!(cell(&buf, (3, 4)), OBSTACLE);
        assert_eq!(cell(&buf, (0, 0)), "  ", "empty cells stay blank");
    }

    #[test]
    fn board_clips_to_area() {
        let snapshot = snapshot();
        let area = Rect::new(0, 0, 6, 5);
        let mut buf = Buffer::empty(area);
        Board::new(&snapshot).render(area, &mut buf);
        assert_eq!(cell(&buf, (1, 2)), BODY, "visible cells still drawn");
        assert_eq!(cell(&buf, (0, 0)), "  ");
    }

    #[test]
    fn game_waits_for_frames() {
        let mut game = Game::default();
        let area = Rect::new(0, 0, 60, 10);
        let mut buf = Buffer::empty(area);
        game.render_ref(area, &mut buf);

        game.update(GameFrame {
            snapshot: snapshot(),
            episode: 3,
            epsilon: 0.5,
            record: 7,
        });
        game.render_ref(area, &mut buf);
        let text = (0..area.height)
            .flat_map(|y| (0..area.width).map(move |x| (x, y)))
            .map(|(x, y)| buf.get(x, y).symbol().to_string())
            .collect::<String>();
        assert!(text.contains("Record: 7"));
        assert!(text.contains("Epsilon: 0.500"));
    }
}
