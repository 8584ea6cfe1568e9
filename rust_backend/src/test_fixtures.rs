//! Shared proposal document for unit tests.

/// Two targets, three observations. Observation 10 has two up-to-date
/// visits, observation 9 a stale one, observation 11 no planner data.
pub(crate) const PROPOSAL_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<JwstProposal xmlns="urn:apt" xmlns:nci="urn:apt:nircam-imaging" schemaVersion="2024.1">
  <Targets>
    <Target>
      <Number>2</Number>
      <TargetName>M31</TargetName>
      <TargetID>2 M31</TargetID>
      <EquatorialCoordinates Value="00 42 44.330 +41 16 07.50"/>
      <RAProperMotion>0.0</RAProperMotion>
      <RAProperMotionUnits>mas/yr</RAProperMotionUnits>
      <DecProperMotion>0.0</DecProperMotion>
      <DecProperMotionUnits>mas/yr</DecProperMotionUnits>
    </Target>
    <Target>
      <Number>1</Number>
      <TargetName>NGC-1234</TargetName>
      <TargetID>1 NGC-1234</TargetID>
      <EquatorialCoordinates Value="05 35 17.300 -05 23 28.00"/>
      <RAProperMotion>1.5</RAProperMotion>
      <RAProperMotionUnits/>
      <DecProperMotion>-2.0</DecProperMotion>
      <DecProperMotionUnits/>
    </Target>
  </Targets>
  <DataRequests>
    <ObservationGroup>
      <Observation>
        <Number>10</Number>
        <TargetID>1 NGC-1234</TargetID>
        <Instrument>NIRCAM</Instrument>
        <Template>
          <nci:NircamImaging><nci:Module>ALL</nci:Module></nci:NircamImaging>
        </Template>
        <MosaicParameters>
          <Rows>2</Rows>
          <Columns>3</Columns>
          <RowOverlapPercent>10.0</RowOverlapPercent>
          <ColumnOverlapPercent>12.5</ColumnOverlapPercent>
          <SkewDegreesX>0.0</SkewDegreesX>
          <SkewDegreesY>0.5</SkewDegreesY>
        </MosaicParameters>
        <VisitPlannerData>
          <ToolValue Name="VisitPlanner:1234:10:1">&lt;VisitPlannerResult&gt;&lt;StVisitSchedulingWindows UpToDate="true"&gt;&lt;StConstraintSchedulingWindows Type="sun" StSchedulingPCF="0.0:360.0 1.0 0 99000"/&gt;&lt;StConstraintSchedulingWindows Type="guide-star" StSchedulingPCF="0.0:10.0 1.0 1000 2000 0.0:10.0 1.0 2000 3000"/&gt;&lt;/StVisitSchedulingWindows&gt;&lt;/VisitPlannerResult&gt;</ToolValue>
          <ToolValue Name="VisitPlanner:1234:10:2"><![CDATA[<VisitPlannerResult><StVisitSchedulingWindows><StConstraintSchedulingWindows Type="guide-star" StSchedulingPCF="20.0:40.0 0.5 5000 9000 9000 12000"/></StVisitSchedulingWindows></VisitPlannerResult>]]></ToolValue>
        </VisitPlannerData>
      </Observation>
      <Observation>
        <Number>9</Number>
        <TargetID>2 M31</TargetID>
        <Instrument>NIRSPEC</Instrument>
        <Template>
          <Unqualified xmlns=""/>
        </Template>
        <VisitPlannerData>
          <ToolValue Name="VisitPlanner:1234:9:1"><![CDATA[<VisitPlannerResult><StVisitSchedulingWindows UpToDate="false"><StConstraintSchedulingWindows Type="guide-star" StSchedulingPCF="0.0:10.0 1.0 1000 2000"/></StVisitSchedulingWindows></VisitPlannerResult>]]></ToolValue>
        </VisitPlannerData>
      </Observation>
      <Observation>
        <Number>11</Number>
        <TargetID>2 M31</TargetID>
        <Instrument>MIRI</Instrument>
      </Observation>
    </ObservationGroup>
  </DataRequests>
</JwstProposal>
"#;
