//! Built-in sample snippets used to prefill the workbench.

use crate::language::Language;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Template {
    pub slug: &'static str,
    pub title: &'static str,
    pub language: Language,
    pub code: &'static str,
}

pub const TEMPLATES: &[Template] = &[
    Template {
        slug: "python-matplotlib",
        title: "Python - Matplotlib (Static)",
        language: Language::Python,
        code: PYTHON_MATPLOTLIB,
    },
    Template {
        slug: "python-plotly",
        title: "Python - Plotly (Interactive)",
        language: Language::Python,
        code: PYTHON_PLOTLY,
    },
    Template {
        slug: "r-ggplot2",
        title: "R - ggplot2 (Static)",
        language: Language::R,
        code: R_GGPLOT2,
    },
    Template {
        slug: "r-plotly",
        title: "R - Plotly (Interactive)",
        language: Language::R,
        code: R_PLOTLY,
    },
];

/// Look a template up by slug, 1-based index, or title (case-insensitive).
pub fn find(name: &str) -> Option<&'static Template> {
    let name = name.trim();
    if let Ok(idx) = name.parse::<usize>() {
        return idx.checked_sub(1).and_then(|i| TEMPLATES.get(i));
    }
    TEMPLATES
        .iter()
        .find(|t| t.slug.eq_ignore_ascii_case(name) || t.title.eq_ignore_ascii_case(name))
}

const PYTHON_MATPLOTLIB: &str = r#"import matplotlib.pyplot as plt
import numpy as np

categories = ['A', 'B', 'C', 'D', 'E']
values = np.random.rand(5) * 10

plt.figure(figsize=(8, 6))
plt.bar(categories, values, color='skyblue')
plt.title('Simple Bar Chart')
plt.xlabel('Categories')
plt.ylabel('Values')
plt.grid(axis='y', linestyle='--', alpha=0.7)"#;

const PYTHON_PLOTLY: &str = r#"import plotly.graph_objects as go
import numpy as np

x = np.linspace(0, 10, 100)
y = np.sin(x)

fig = go.Figure()
fig.add_trace(go.Scatter(x=x, y=y, mode='lines', name='sin(x)'))
fig.update_layout(
    title='Interactive Sine Wave',
    xaxis_title='X',
    yaxis_title='sin(X)',
    template='plotly_white'
)"#;

const R_GGPLOT2: &str = r#"library(ggplot2)

data <- data.frame(
  category = c("A", "B", "C", "D", "E"),
  value = runif(5) * 10
)

p <- ggplot(data, aes(x = category, y = value)) +
  geom_bar(stat = "identity", fill = "steelblue") +
  labs(title = "Simple Bar Chart", x = "Categories", y = "Values") +
  theme_minimal()

print(p)"#;

const R_PLOTLY: &str = r#"library(plotly)

x <- seq(0, 10, length.out = 100)
y <- sin(x)
data <- data.frame(x = x, y = y)

p <- plot_ly(data, x = ~x, y = ~y, type = 'scatter', mode = 'lines',
             line = list(color = 'blue')) %>%
  layout(title = 'Interactive Sine Wave',
         xaxis = list(title = 'X'),
         yaxis = list(title = 'sin(X)'))

print(p)"#;
