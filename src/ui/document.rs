use serde::Serialize;

// ============================================================================
// Declarative panel document: panel -> page -> rows -> widgets
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum WidgetType {
    Text,
    Button,
}

impl WidgetType {
    pub fn as_str(&self) -> &'static str {
        match self {
            WidgetType::Text => "Text",
            WidgetType::Button => "Button",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Widget {
    pub id: String,
    pub name: String,
    pub widget_type: WidgetType,
    /// Device style string, e.g. `size=2;fontSize=normal;align=left`
    pub options: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Row {
    pub widgets: Vec<Widget>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PanelDocument {
    pub panel_id: String,
    pub name: String,
    pub rows: Vec<Row>,
}

impl PanelDocument {
    pub fn new(panel_id: &str, name: &str) -> Self {
        Self {
            panel_id: panel_id.to_string(),
            name: name.to_string(),
            rows: Vec::new(),
        }
    }

    pub fn push_row(&mut self, widgets: Vec<Widget>) {
        self.rows.push(Row { widgets });
    }

    /// Look up a widget anywhere in the document.
    pub fn widget(&self, id: &str) -> Option<&Widget> {
        self.rows
            .iter()
            .flat_map(|row| row.widgets.iter())
            .find(|w| w.id == id)
    }

    pub fn widget_ids(&self) -> Vec<&str> {
        self.rows
            .iter()
            .flat_map(|row| row.widgets.iter())
            .map(|w| w.id.as_str())
            .collect()
    }

    /// SHA-1 of the XML form, stable across identical renders.
    pub fn fingerprint(&self) -> String {
        use sha1::{Digest, Sha1};

        let mut hasher = Sha1::new();
        hasher.update(self.to_xml().as_bytes());
        format!("{:x}", hasher.finalize())
    }

    /// Render the device `<Extensions>` XML for this panel.
    ///
    /// ```xml
    /// <Extensions>
    ///   <Panel>
    ///     <Location>HomeScreenAndCallControls</Location>
    ///     ...
    ///     <Page>
    ///       <Name>Report Issue</Name>
    ///       <Row><Widget>...</Widget></Row>
    ///       <Options>hideRowNames=1</Options>
    ///     </Page>
    ///   </Panel>
    /// </Extensions>
    /// ```
    pub fn to_xml(&self) -> String {
        let mut rows = String::new();
        for row in &self.rows {
            rows.push_str("      <Row>\n");
            for widget in &row.widgets {
                rows.push_str(&format!(
                    "        <Widget>\n          <WidgetId>{id}</WidgetId>\n          <Name>{name}</Name>\n          <Type>{kind}</Type>\n          <Options>{options}</Options>\n        </Widget>\n",
                    id = escape_xml(&widget.id),
                    name = escape_xml(&widget.name),
                    kind = widget.widget_type.as_str(),
                    options = escape_xml(&widget.options),
                ));
            }
            rows.push_str("      </Row>\n");
        }

        format!(
            "<Extensions>\n  <Panel>\n    <Location>HomeScreenAndCallControls</Location>\n    <Type>Statusbar</Type>\n    <Icon>Helpdesk</Icon>\n    <Name>{name}</Name>\n    <Color>#0067ac</Color>\n    <ActivityType>Custom</ActivityType>\n    <Page>\n      <Name>{name}</Name>\n{rows}      <Options>hideRowNames=1</Options>\n    </Page>\n  </Panel>\n</Extensions>\n",
            name = escape_xml(&self.name),
            rows = rows,
        )
    }
}

/// Escape XML special characters.
pub fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
