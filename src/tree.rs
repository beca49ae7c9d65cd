// https://github.com/softprops/treeline/blob/eaaa03a5fac200fb5255c8aa927de43e7974745f/src/lib.rs
// Original work Copyright (c) 2015-2016 Doug Tangren
// Modified work Copyright (c) 2019 Cole Helbling
//
// Permission is hereby granted, free of charge, to any person obtaining
// a copy of this software and associated documentation files (the
// "Software"), to deal in the Software without restriction, including
// without limitation the rights to use, copy, modify, merge, publish,
// distribute, sublicense, and/or sell copies of the Software, and to
// permit persons to whom the Software is furnished to do so, subject to
// the following conditions:
//
// The above copyright notice and this permission notice shall be
// included in all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND,
// EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF
// MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND
// NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE
// LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION
// OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN CONNECTION
// WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

use std::fmt;
use std::fmt::Display;

use termion::color;
use termion::style;

use crate::node::Node;

const EDGE: &str = "├── ";
const LINE: &str = "│   ";
const CORNER: &str = "└── ";
const BLANK: &str = "    ";

const ROOT: &str = "Vault";

/// Groups and entries drawn like `tree(1)`; groups in bold blue.
#[derive(Debug, Clone, Copy)]
pub struct Tree<'a> {
    nodes: &'a [Node],
    color: bool,
}

pub fn tree(nodes: &[Node]) -> Tree<'_> {
    Tree { nodes, color: true }
}

impl<'a> Tree<'a> {
    /// Drops the terminal escapes, e.g. when stdout is not a tty.
    pub fn plain(self) -> Self {
        Tree {
            color: false,
            ..self
        }
    }

    fn write_group(&self, f: &mut fmt::Formatter, name: &str) -> fmt::Result {
        if self.color {
            writeln!(
                f,
                "{bold}{blue}{}{reset}",
                name,
                bold = style::Bold,
                blue = color::Fg(color::Blue),
                reset = style::Reset
            )
        } else {
            writeln!(f, "{}", name)
        }
    }

    fn draw_tree(&self, f: &mut fmt::Formatter, leaves: &[Node], prefix: &mut Vec<bool>) -> fmt::Result {
        for (i, leaf) in leaves.iter().enumerate() {
            let last = i + 1 == leaves.len();

            for s in prefix.iter() {
                write!(f, "{}", if *s { BLANK } else { LINE })?;
            }
            write!(f, "{}", if last { CORNER } else { EDGE })?;

            match leaf {
                Node::Group(group) => {
                    self.write_group(f, leaf.display_title())?;
                    if !group.entries.is_empty() {
                        prefix.push(last);
                        self.draw_tree(f, &group.entries, prefix)?;
                        prefix.pop();
                    }
                }
                Node::Entry(entry) => match entry.user.as_deref() {
                    Some(user) if self.color => writeln!(
                        f,
                        "{} {faint}({}){reset}",
                        entry.display_title(),
                        user,
                        faint = style::Faint,
                        reset = style::Reset
                    )?,
                    Some(user) => writeln!(f, "{} ({})", entry.display_title(), user)?,
                    None => writeln!(f, "{}", entry.display_title())?,
                },
            }
        }

        Ok(())
    }
}

impl Display for Tree<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.write_group(f, ROOT)?;
        self.draw_tree(f, self.nodes, &mut Vec::new())
    }
}
